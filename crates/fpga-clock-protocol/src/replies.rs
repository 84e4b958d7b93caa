//! Replies sent by the host.
//!
//! Every reply is exactly [`REPLY_LEN`] bytes, one numeric field per byte,
//! most significant field first:
//!
//! ```text
//! time: +------+--------+--------+
//!       | hour | minute | second |
//!       +------+--------+--------+
//! date: +-----+-------+----------+
//!       | day | month | year%100 |
//!       +-----+-------+----------+
//! ```

use bytes::Buf;
use chrono::{Datelike, Timelike};

use crate::commands::Command;
use crate::constants::*;
use crate::error::ProtocolError;

/// Wall-clock time of day, answered to [`Command::Time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReply {
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
}

impl TimeReply {
    /// Sample the time-of-day fields from a clock reading.
    pub fn from_time<T: Timelike>(now: &T) -> Self {
        TimeReply {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> [u8; REPLY_LEN] {
        [self.hour, self.minute, self.second]
    }

    /// Decode and range-check a time reply.
    pub fn decode(mut data: &[u8]) -> Result<Self, ProtocolError> {
        check_len(data)?;
        let hour = data.get_u8();
        let minute = data.get_u8();
        let second = data.get_u8();
        check_range("hour", hour, 0, 23)?;
        check_range("minute", minute, 0, 59)?;
        check_range("second", second, 0, 59)?;
        Ok(TimeReply { hour, minute, second })
    }
}

impl std::fmt::Display for TimeReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Calendar date, answered to [`Command::Date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateReply {
    /// Day of month, 1-31.
    pub day: u8,
    /// Month, 1-12.
    pub month: u8,
    /// Year modulo 100.
    pub year: u8,
}

impl DateReply {
    /// Sample the date fields from a clock reading.
    pub fn from_date<D: Datelike>(now: &D) -> Self {
        DateReply {
            day: now.day() as u8,
            month: now.month() as u8,
            // rem_euclid keeps BCE years in 0..100
            year: now.year().rem_euclid(YEAR_MODULUS) as u8,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> [u8; REPLY_LEN] {
        [self.day, self.month, self.year]
    }

    /// Decode and range-check a date reply.
    pub fn decode(mut data: &[u8]) -> Result<Self, ProtocolError> {
        check_len(data)?;
        let day = data.get_u8();
        let month = data.get_u8();
        let year = data.get_u8();
        check_range("day", day, 1, 31)?;
        check_range("month", month, 1, 12)?;
        check_range("year", year, 0, 99)?;
        Ok(DateReply { day, month, year })
    }
}

impl std::fmt::Display for DateReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}/{:02}", self.day, self.month, self.year)
    }
}

/// A reply to a known command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Answer to [`Command::Time`].
    Time(TimeReply),
    /// Answer to [`Command::Date`].
    Date(DateReply),
}

impl Reply {
    /// Build the reply for `cmd` from a single clock reading.
    ///
    /// Returns `None` for [`Command::Unknown`], which is never answered.
    pub fn for_command<T>(cmd: Command, now: &T) -> Option<Self>
    where
        T: Datelike + Timelike,
    {
        match cmd {
            Command::Time => Some(Reply::Time(TimeReply::from_time(now))),
            Command::Date => Some(Reply::Date(DateReply::from_date(now))),
            Command::Unknown(_) => None,
        }
    }

    /// The command this reply answers.
    pub fn command(&self) -> Command {
        match self {
            Reply::Time(_) => Command::Time,
            Reply::Date(_) => Command::Date,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> [u8; REPLY_LEN] {
        match self {
            Reply::Time(t) => t.encode(),
            Reply::Date(d) => d.encode(),
        }
    }

    /// Short operator-facing label, e.g. `Time Request`.
    pub fn label(&self) -> &'static str {
        match self {
            Reply::Time(_) => "Time Request",
            Reply::Date(_) => "Date Request",
        }
    }

    /// Metric label for this reply kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Time(_) => "time",
            Reply::Date(_) => "date",
        }
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Time(t) => write!(f, "{}", t),
            Reply::Date(d) => write!(f, "{}", d),
        }
    }
}

fn check_len(data: &[u8]) -> Result<(), ProtocolError> {
    if data.len() < REPLY_LEN {
        return Err(ProtocolError::ReplyTooShort {
            expected: REPLY_LEN,
            actual: data.len(),
        });
    }
    Ok(())
}

fn check_range(field: &'static str, value: u8, min: u8, max: u8) -> Result<(), ProtocolError> {
    if value < min || value > max {
        return Err(ProtocolError::FieldOutOfRange { field, value });
    }
    Ok(())
}
