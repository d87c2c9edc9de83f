//! # mcrcon-protocol
//!
//! Wire protocol implementation for RCON.
//!
//! This crate provides:
//! - Binary packet framing with a little-endian length prefix
//! - Packet type discriminants used by login, command and response packets
//! - An incremental decoder for reassembling packets from a byte stream

pub mod codec;
pub mod error;
pub mod packet;

pub use codec::{Decoder, Encoder};
pub use error::ProtocolError;
pub use packet::{Packet, PacketType, LENGTH_FIELD_SIZE, MIN_PACKET_LENGTH};

/// Default RCON port.
pub const DEFAULT_PORT: u16 = 25575;

/// Maximum payload size: `id + type + payload + 2 terminator bytes` must fit in an `i32`.
pub const MAX_PAYLOAD_SIZE: usize = i32::MAX as usize - 10;
