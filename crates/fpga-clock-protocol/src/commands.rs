//! Commands sent by the board.

use crate::constants::*;

/// A button command received from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Request the current time (centre button).
    Time,
    /// Request the current date (up button).
    Date,
    /// Any other byte. Logged and ignored.
    Unknown(u8),
}

impl Command {
    /// Decode a command from the byte read off the link.
    pub fn decode(byte: u8) -> Self {
        match byte {
            CMD_TIME => Command::Time,
            CMD_DATE => Command::Date,
            other => Command::Unknown(other),
        }
    }

    /// Get the wire byte for this command.
    pub fn code(&self) -> u8 {
        match self {
            Command::Time => CMD_TIME,
            Command::Date => CMD_DATE,
            Command::Unknown(code) => *code,
        }
    }

    /// Whether the host answers this command.
    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Command::decode(byte)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Time => write!(f, "time request"),
            Command::Date => write!(f, "date request"),
            Command::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}
