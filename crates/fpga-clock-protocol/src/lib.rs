//! FPGA Clock Serial Protocol
//!
//! This crate provides the wire types exchanged between the FPGA clock board
//! and its host-side companion. The protocol has no framing: the board sends a
//! single command byte when a button is pressed, and the host answers with
//! exactly three raw bytes.
//!
//! # Protocol Overview
//!
//! - **Commands** (board → host): one byte, [`CMD_TIME`] or [`CMD_DATE`]
//! - **Replies** (host → board): three bytes, one value per byte, no checksum
//!
//! | Command | Reply bytes                        |
//! |---------|------------------------------------|
//! | `0x00`  | hour (0-23), minute, second        |
//! | `0x01`  | day (1-31), month (1-12), year % 100 |
//!
//! Any other command byte is not answered.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fpga_clock_protocol::{Command, Reply};
//!
//! let now = NaiveDate::from_ymd_opt(2031, 3, 7)
//!     .unwrap()
//!     .and_hms_opt(14, 5, 9)
//!     .unwrap();
//!
//! let cmd = Command::decode(0x01);
//! let reply = Reply::for_command(cmd, &now).unwrap();
//! assert_eq!(reply.encode(), [7, 3, 31]);
//! ```

mod commands;
mod constants;
mod error;
mod replies;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use replies::*;
