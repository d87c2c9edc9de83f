//! Encoder and decoder for RCON packets.

use crate::error::ProtocolError;
use crate::packet::{Packet, PacketType, LENGTH_FIELD_SIZE};
use bytes::{Bytes, BytesMut};

/// Encodes packets into wire bytes.
pub struct Encoder;

impl Encoder {
    /// Encodes an `(id, type, payload)` triple.
    pub fn encode(
        id: i32,
        packet_type: PacketType,
        payload: &[u8],
    ) -> Result<BytesMut, ProtocolError> {
        Packet::new(id, packet_type, Bytes::copy_from_slice(payload)).encode()
    }

    /// Encodes a packet.
    pub fn encode_packet(packet: &Packet) -> Result<BytesMut, ProtocolError> {
        packet.encode()
    }
}

/// Reassembles packets from a byte stream read in arbitrary chunks.
pub struct Decoder {
    buffer: BytesMut,
    /// Largest accepted packet, length prefix included. `None` accepts any
    /// length the field can express.
    max_packet_size: Option<usize>,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            max_packet_size: None,
        }
    }

    /// Rejects packets whose declared size exceeds `max` before buffering them.
    pub fn with_max_packet_size(mut self, max: usize) -> Self {
        self.max_packet_size = Some(max);
        self
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next packet from the buffer.
    pub fn decode_packet(&mut self) -> Result<Option<Packet>, ProtocolError> {
        if let (Some(max), Some(size)) = (self.max_packet_size, self.pending_packet_size()?) {
            if size > max {
                return Err(ProtocolError::PacketTooLarge { size, max });
            }
        }
        Packet::decode(&mut self.buffer)
    }

    /// Returns the full size (length prefix included) of the packet at the
    /// front of the buffer, if its length field has arrived.
    pub fn pending_packet_size(&self) -> Result<Option<usize>, ProtocolError> {
        Ok(Packet::peek_length(&self.buffer)?.map(|len| LENGTH_FIELD_SIZE + len as usize))
    }

    /// Returns whether a complete length field is buffered.
    pub fn has_length(&self) -> bool {
        self.buffer.len() >= LENGTH_FIELD_SIZE
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
