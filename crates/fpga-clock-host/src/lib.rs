//! Host-side companion for the FPGA clock board.
//!
//! The board sends a single command byte over serial when a button is pressed;
//! this crate answers with the host's current time or date as three raw bytes
//! (see [`fpga_clock_protocol`]).
//!
//! Modules:
//!
//! - [`link`]: the serial byte channel ([`SerialLink`], [`PortLink`], [`MockLink`])
//! - [`clock`]: where the wall-clock reading comes from
//! - [`poll_loop`]: the Idle / Dispatch / Shutdown loop
//! - [`shutdown`]: Ctrl+C latched into a shared flag
//! - [`config`]: serial and timing parameters
//! - [`metric_defs`]: counter names and descriptions

pub mod clock;
pub mod config;
pub mod link;
pub mod metric_defs;
pub mod poll_loop;
pub mod shutdown;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, HostConfig};
pub use link::{LinkError, MockLink, PortLink, SerialLink};
pub use poll_loop::{Exit, PollLoop, SessionStats, Step};
pub use shutdown::ShutdownSignal;
