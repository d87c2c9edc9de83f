//! Binary packet format for RCON.
//!
//! Packet layout (all integers little-endian):
//!
//! ```text
//! +--------+--------+--------+-------------+------+------+
//! | length |   id   |  type  |   payload   | 0x00 | 0x00 |
//! | 4 bytes| 4 bytes| 4 bytes| length - 10 |      |      |
//! +--------+--------+--------+-------------+------+------+
//! ```
//!
//! `length` counts every byte that follows it.

use crate::error::ProtocolError;
use crate::MAX_PAYLOAD_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::borrow::Cow;

/// Size of the length prefix in bytes.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Smallest valid value of the length field: id + type + two terminator bytes.
pub const MIN_PACKET_LENGTH: i32 = 10;

/// Packet kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Response fragment, also used for the end-of-response padding packet.
    Response,
    /// Command request. Servers reuse this value for login replies.
    Command,
    /// Login request carrying the password.
    Login,
    /// Any other value seen on the wire.
    Other(i32),
}

impl PacketType {
    pub fn as_i32(self) -> i32 {
        match self {
            PacketType::Response => 0,
            PacketType::Command => 2,
            PacketType::Login => 3,
            PacketType::Other(value) => value,
        }
    }
}

impl From<i32> for PacketType {
    fn from(value: i32) -> Self {
        match value {
            0 => PacketType::Response,
            2 => PacketType::Command,
            3 => PacketType::Login,
            other => PacketType::Other(other),
        }
    }
}

impl From<PacketType> for i32 {
    fn from(value: PacketType) -> Self {
        value.as_i32()
    }
}

/// A single RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Request correlation id, echoed by the server (`-1` on failed login).
    pub id: i32,
    /// Packet kind.
    pub packet_type: PacketType,
    /// Payload bytes, without the trailing terminator pair.
    pub payload: Bytes,
}

impl Packet {
    pub fn new(id: i32, packet_type: PacketType, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            packet_type,
            payload: payload.into(),
        }
    }

    /// Creates a login packet carrying `password`.
    pub fn login(id: i32, password: &str) -> Self {
        Self::new(id, PacketType::Login, Bytes::copy_from_slice(password.as_bytes()))
    }

    /// Creates a command packet.
    pub fn command(id: i32, command: &str) -> Self {
        Self::new(id, PacketType::Command, Bytes::copy_from_slice(command.as_bytes()))
    }

    /// Creates the empty response-type packet sent after a command.
    pub fn padding(id: i32) -> Self {
        Self::new(id, PacketType::Response, Bytes::new())
    }

    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    pub fn payload_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Returns the value of the length field for a payload of `payload_len` bytes.
    pub fn encoded_length(payload_len: usize) -> Result<i32, ProtocolError> {
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(MIN_PACKET_LENGTH + payload_len as i32)
    }

    /// Encodes the packet into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let length = Self::encoded_length(self.payload.len())?;
        let mut buf = BytesMut::with_capacity(LENGTH_FIELD_SIZE + length as usize);

        buf.put_i32_le(length);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.packet_type.as_i32());
        buf.put_slice(&self.payload);
        buf.put_u8(0);
        buf.put_u8(0);

        Ok(buf)
    }

    /// Reads the length field at the front of `buf` without consuming it.
    ///
    /// Returns `Ok(None)` if fewer than four bytes are buffered.
    pub fn peek_length(buf: &[u8]) -> Result<Option<i32>, ProtocolError> {
        if buf.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }
        let length = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if length < MIN_PACKET_LENGTH {
            return Err(ProtocolError::InvalidLength(length));
        }
        Ok(Some(length))
    }

    /// Decodes a packet from bytes.
    ///
    /// Returns `Ok(Some(packet))` if a complete packet was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on a malformed length field.
    /// The two terminator bytes are dropped without being checked.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        let length = match Self::peek_length(buf)? {
            Some(length) => length as usize,
            None => return Ok(None),
        };

        if buf.len() < LENGTH_FIELD_SIZE + length {
            return Ok(None);
        }

        buf.advance(LENGTH_FIELD_SIZE);
        let id = buf.get_i32_le();
        let packet_type = PacketType::from(buf.get_i32_le());
        let payload = buf.split_to(length - MIN_PACKET_LENGTH as usize).freeze();
        buf.advance(2);

        Ok(Some(Self {
            id,
            packet_type,
            payload,
        }))
    }
}
