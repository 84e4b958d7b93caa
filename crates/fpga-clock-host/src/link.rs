//! Serial link to the board.
//!
//! [`SerialLink`] is the byte channel the poll loop owns. [`PortLink`] is the
//! real serial port; [`MockLink`] replays a script and records everything
//! the loop does to it.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Instant;

use serialport::{SerialPort, SerialPortInfo};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::shutdown::ShutdownSignal;

/// Errors on the serial link. Every one of these ends the session.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The port could not be opened.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Error reported by the serial driver.
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The link was used after [`SerialLink::close`].
    #[error("link is closed")]
    Closed,
}

/// A byte channel to the board.
pub trait SerialLink {
    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> Result<u32, LinkError>;

    /// Read up to `buf.len()` bytes. Returns 0 if the read timed out.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Release the link. Calling this again is a no-op.
    fn close(&mut self);

    /// Whether the link is still open.
    fn is_open(&self) -> bool;
}

// ============================================================================
// Serial Port
// ============================================================================

/// A serial port opened with [`serialport`].
///
/// Data bits, parity, stop bits and flow control are left at the driver
/// defaults (8N1, no flow control).
pub struct PortLink {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl PortLink {
    /// Open the configured port and wait out the settling delay.
    ///
    /// Many boards reset when the port opens; nothing is read or written
    /// until [`HostConfig::settle_delay`] has passed.
    pub fn open(config: &HostConfig) -> Result<Self, LinkError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| LinkError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(
            port = %config.port,
            baud = config.baud_rate,
            timeout_ms = config.read_timeout_ms,
            "Serial port opened"
        );

        let settle = config.settle_delay();
        if !settle.is_zero() {
            debug!(settle_ms = config.settle_ms, "Waiting for board to settle");
            thread::sleep(settle);
        }

        Ok(PortLink {
            name: config.port.clone(),
            port: Some(port),
        })
    }

    /// Port name this link was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, LinkError> {
        self.port.as_mut().ok_or(LinkError::Closed)
    }
}

impl SerialLink for PortLink {
    fn bytes_available(&mut self) -> Result<u32, LinkError> {
        Ok(self.port()?.bytes_to_read()?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.port()?.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "Serial port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for PortLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Serial ports currently visible to the host.
pub fn list_ports() -> Result<Vec<SerialPortInfo>, LinkError> {
    Ok(serialport::available_ports()?)
}

// ============================================================================
// Scripted Link
// ============================================================================

/// One scripted step for [`MockLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// A byte arrives from the board.
    Byte(u8),
    /// One poll sees nothing.
    Silence,
    /// The next poll fails, e.g. the board was unplugged.
    Fault(io::ErrorKind),
    /// The operator presses Ctrl+C during this poll.
    Interrupt,
}

/// An in-memory link that replays a script and records what it was asked
/// to do.
///
/// Once the script runs out the link reports an unexpected EOF fault, or
/// triggers the attached [`ShutdownSignal`] if there is one.
#[derive(Debug, Default)]
pub struct MockLink {
    script: VecDeque<MockEvent>,
    interrupt: Option<ShutdownSignal>,
    open: bool,
    writes: Vec<Vec<u8>>,
    poll_times: Vec<Instant>,
    reads: usize,
    write_fault: Option<(usize, io::ErrorKind)>,
    close_calls: usize,
    calls_after_close: usize,
}

impl MockLink {
    /// Create an open link that will replay `script`.
    pub fn new<I: IntoIterator<Item = MockEvent>>(script: I) -> Self {
        MockLink {
            script: script.into_iter().collect(),
            open: true,
            ..Default::default()
        }
    }

    /// Create a link that receives `bytes` back to back.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().copied().map(MockEvent::Byte))
    }

    /// Trigger `signal` on [`MockEvent::Interrupt`] and when the script ends.
    pub fn with_interrupt(mut self, signal: ShutdownSignal) -> Self {
        self.interrupt = Some(signal);
        self
    }

    /// Accept `count` writes, then fail every later one with `kind`.
    pub fn fail_writes_after(mut self, count: usize, kind: io::ErrorKind) -> Self {
        self.write_fault = Some((count, kind));
        self
    }

    /// All bytes written, in order.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Each individual write call.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Number of [`SerialLink::bytes_available`] calls.
    pub fn polls(&self) -> usize {
        self.poll_times.len()
    }

    /// When each poll happened.
    pub fn poll_times(&self) -> &[Instant] {
        &self.poll_times
    }

    /// Number of reads that returned a byte.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of times [`SerialLink::close`] was called.
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Reads, writes or polls attempted after close.
    pub fn calls_after_close(&self) -> usize {
        self.calls_after_close
    }

    /// Scripted events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn ensure_open(&mut self) -> Result<(), LinkError> {
        if !self.open {
            self.calls_after_close += 1;
            return Err(LinkError::Closed);
        }
        Ok(())
    }
}

impl SerialLink for MockLink {
    fn bytes_available(&mut self) -> Result<u32, LinkError> {
        self.ensure_open()?;
        self.poll_times.push(Instant::now());

        match self.script.front() {
            Some(MockEvent::Byte(_)) => Ok(1),
            Some(MockEvent::Silence) => {
                self.script.pop_front();
                Ok(0)
            }
            Some(MockEvent::Fault(kind)) => {
                let kind = *kind;
                self.script.pop_front();
                Err(io::Error::new(kind, "scripted fault").into())
            }
            Some(MockEvent::Interrupt) => {
                self.script.pop_front();
                if let Some(signal) = &self.interrupt {
                    signal.trigger();
                }
                Ok(0)
            }
            None => match &self.interrupt {
                Some(signal) => {
                    signal.trigger();
                    Ok(0)
                }
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted").into()),
            },
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        match self.script.front() {
            Some(MockEvent::Byte(b)) => {
                buf[0] = *b;
                self.script.pop_front();
                self.reads += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.ensure_open()?;
        if let Some((count, kind)) = self.write_fault {
            if self.writes.len() >= count {
                return Err(io::Error::new(kind, "scripted write fault").into());
            }
        }
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.close_calls += 1;
        if self.open {
            debug!("Mock link closed");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
