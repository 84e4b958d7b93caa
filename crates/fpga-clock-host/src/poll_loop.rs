//! The host's poll loop.
//!
//! ```text
//!            bytes_available() == 0
//!          +------------------------+
//!          v                        |
//!   +-------------+  byte pending  +-----------+
//!   |    Idle     | -------------> | Dispatch  |
//!   +-------------+ <------------- +-----------+
//!          |          reply sent /       |
//!          |          warning logged     |
//!          | shutdown signal             | link fault
//!          v                             v
//!   +------------------------------------------+
//!   |        Shutdown (link closed once)       |
//!   +------------------------------------------+
//! ```
//!
//! The loop owns its link and clock. Each reply byte is written on its own
//! and followed by a fixed pause so the board can latch it before the next
//! one arrives; the board sends no acknowledgement.

use std::thread;
use std::time::Duration;

use fpga_clock_protocol::{Command, Reply};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{HostConfig, DEFAULT_BYTE_DELAY_MS, DEFAULT_POLL_INTERVAL_MS};
use crate::link::{LinkError, SerialLink};
use crate::metric_defs;
use crate::shutdown::ShutdownSignal;

/// Outcome of one poll that did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing was pending.
    Idle,
    /// A known command was answered.
    Replied(Reply),
    /// An unknown command byte was read and skipped.
    Ignored(u8),
}

/// Why the loop stopped.
#[derive(Debug)]
pub enum Exit {
    /// The operator interrupted the host.
    Interrupted,
    /// The link failed.
    Fault(LinkError),
}

impl Exit {
    /// Process exit code for this outcome.
    pub fn code(&self) -> i32 {
        match self {
            Exit::Interrupted => 0,
            Exit::Fault(_) => 1,
        }
    }
}

/// Counts for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Time replies sent.
    pub time_replies: u64,
    /// Date replies sent.
    pub date_replies: u64,
    /// Unknown command bytes skipped.
    pub unknown_commands: u64,
}

impl SessionStats {
    fn record(&mut self, step: &Step) {
        match step {
            Step::Idle => {}
            Step::Replied(Reply::Time(_)) => self.time_replies += 1,
            Step::Replied(Reply::Date(_)) => self.date_replies += 1,
            Step::Ignored(_) => self.unknown_commands += 1,
        }
    }
}

/// Serves board commands until shutdown.
pub struct PollLoop<L, C> {
    link: L,
    clock: C,
    shutdown: ShutdownSignal,
    byte_delay: Duration,
    poll_interval: Duration,
    stats: SessionStats,
}

impl<L: SerialLink, C: Clock> PollLoop<L, C> {
    /// Create a loop with the default pacing.
    pub fn new(link: L, clock: C, shutdown: ShutdownSignal) -> Self {
        PollLoop {
            link,
            clock,
            shutdown,
            byte_delay: Duration::from_millis(DEFAULT_BYTE_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stats: SessionStats::default(),
        }
    }

    /// Create a loop paced by `config`.
    pub fn from_config(link: L, clock: C, shutdown: ShutdownSignal, config: &HostConfig) -> Self {
        Self::new(link, clock, shutdown)
            .with_byte_delay(config.byte_delay())
            .with_poll_interval(config.poll_interval())
    }

    /// Set the pause after each reply byte.
    pub fn with_byte_delay(mut self, delay: Duration) -> Self {
        self.byte_delay = delay;
        self
    }

    /// Set the sleep between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The link this loop owns.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Counts so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Consume the loop, returning its link.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Poll once and serve at most one command.
    ///
    /// Reads exactly one byte when any are pending. The clock is sampled once
    /// per command so all three reply bytes come from the same reading.
    pub fn step(&mut self) -> Result<Step, LinkError> {
        if self.link.bytes_available()? == 0 {
            return Ok(Step::Idle);
        }

        let mut buf = [0u8; 1];
        if self.link.read(&mut buf)? == 0 {
            // Reported pending but the read timed out.
            return Ok(Step::Idle);
        }
        let byte = buf[0];
        debug!(byte, "Command byte received");

        let cmd = Command::decode(byte);
        let step = match Reply::for_command(cmd, &self.clock.now()) {
            Some(reply) => {
                println!("[{}] Sending: {}", reply.label(), reply);
                self.send(&reply)?;
                let kind_label = metric_defs::REPLIES.labels[0];
                metrics::counter!(metric_defs::REPLIES.name, kind_label => reply.kind()).increment(1);
                Step::Replied(reply)
            }
            None => {
                warn!("Unknown option received: {}", byte);
                metrics::counter!(metric_defs::UNKNOWN_COMMANDS.name).increment(1);
                Step::Ignored(byte)
            }
        };

        self.stats.record(&step);
        Ok(step)
    }

    /// Run until the shutdown signal is set or the link faults.
    ///
    /// The link is closed exactly once on the way out, whichever way the
    /// loop ends. The signal is checked before every poll, so nothing is
    /// read or written once an interrupt has been observed.
    pub fn run(&mut self) -> Exit {
        let exit = loop {
            if self.shutdown.is_triggered() {
                break Exit::Interrupted;
            }
            if let Err(e) = self.step() {
                break Exit::Fault(e);
            }
            pause(self.poll_interval);
        };

        match &exit {
            Exit::Interrupted => {
                println!("\n\nClosing serial port...");
                info!("Interrupted, closing serial port");
            }
            Exit::Fault(e) => {
                metrics::counter!(metric_defs::LINK_FAULTS.name).increment(1);
                // The caller reports the fault to the operator.
                debug!(error = %e, "Link fault, closing serial port");
            }
        }
        self.link.close();

        info!(
            time_replies = self.stats.time_replies,
            date_replies = self.stats.date_replies,
            unknown_commands = self.stats.unknown_commands,
            "Session ended"
        );
        exit
    }

    fn send(&mut self, reply: &Reply) -> Result<(), LinkError> {
        for byte in reply.encode() {
            self.link.write_all(&[byte])?;
            pause(self.byte_delay);
        }
        Ok(())
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
