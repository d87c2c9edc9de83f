//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur while framing packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("invalid packet length: {0}")]
    InvalidLength(i32),

    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },
}
