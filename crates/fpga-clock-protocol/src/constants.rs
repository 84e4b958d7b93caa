//! Protocol constants
//!
//! Command codes sent by the board and the fixed reply size.

// ============================================================================
// Command Codes (board → host)
// ============================================================================

/// Centre button: request the current time.
pub const CMD_TIME: u8 = 0;
/// Up button: request the current date.
pub const CMD_DATE: u8 = 1;

// ============================================================================
// Replies (host → board)
// ============================================================================

/// Number of bytes in every reply.
pub const REPLY_LEN: usize = 3;

/// Two-digit years wrap at this modulus.
pub const YEAR_MODULUS: i32 = 100;
