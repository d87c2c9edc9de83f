//! Command response collection.
//!
//! RCON servers may split a command's output over several response packets
//! that all carry the command's id, and nothing marks the last one. After the
//! command the client sends an empty response-type packet with a derived
//! "padding" id. Servers answer packets in order, so the padding echo arrives
//! only once every genuine fragment has been flushed.
//!
//! This is a heuristic, not a protocol guarantee: it relies on the server
//! echoing the padding packet after the command output, and on the short
//! delay before the padding packet is sent. The derived id cannot collide
//! with a request id because request ids stay below
//! [`crate::ids::MAX_REQUEST_ID`].

use crate::error::ClientError;
use bytes::BytesMut;
use mcrcon_protocol::{Packet, PacketType};

/// Offset added to a command id to form its padding id.
pub const SENTINEL_OFFSET: i32 = 2 << 29;

/// Returns the padding id paired with `request_id`.
pub fn sentinel_id(request_id: i32) -> i32 {
    request_id.wrapping_add(SENTINEL_OFFSET)
}

/// State of one command exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    AwaitingFragments,
    Complete,
    Aborted,
}

/// Outcome of feeding one packet to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A fragment was buffered; keep reading.
    Pending,
    /// The padding echo arrived; holds the full response text.
    Complete(String),
}

/// Accumulates response fragments for a single command.
#[derive(Debug)]
pub struct ResponseCollector {
    request_id: i32,
    sentinel_id: i32,
    buffer: BytesMut,
    fragments: usize,
    state: ExchangeState,
}

impl ResponseCollector {
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            sentinel_id: sentinel_id(request_id),
            buffer: BytesMut::new(),
            fragments: 0,
            state: ExchangeState::AwaitingFragments,
        }
    }

    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    pub fn sentinel_id(&self) -> i32 {
        self.sentinel_id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Number of fragments buffered so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Feeds one received packet into the exchange.
    ///
    /// Any error moves the exchange to `Aborted` and discards buffered text.
    pub fn accept(&mut self, packet: Packet) -> Result<Progress, ClientError> {
        debug_assert_eq!(self.state, ExchangeState::AwaitingFragments);

        if packet.packet_type != PacketType::Response {
            return Err(self.abort(ClientError::UnexpectedPacketType {
                id: packet.id,
                packet_type: packet.packet_type.as_i32(),
            }));
        }

        if packet.id == self.request_id {
            self.buffer.extend_from_slice(&packet.payload);
            self.fragments += 1;
            Ok(Progress::Pending)
        } else if packet.id == self.sentinel_id {
            self.state = ExchangeState::Complete;
            let text = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            Ok(Progress::Complete(text))
        } else {
            Err(self.abort(ClientError::UnknownPacketId {
                id: packet.id,
                expected: self.request_id,
                sentinel: self.sentinel_id,
            }))
        }
    }

    /// Marks the exchange as failed, e.g. when the stream breaks mid-response.
    pub fn abort(&mut self, err: ClientError) -> ClientError {
        self.state = ExchangeState::Aborted;
        self.buffer.clear();
        err
    }
}
