//! Client error types.

use std::time::Duration;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] mcrcon_protocol::ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("truncated packet: expected {expected} bytes, received {received}")]
    TruncatedPacket { expected: usize, received: usize },

    #[error("wrong password")]
    AuthenticationFailed,

    #[error("unexpected packet id during login: expected {expected}, got {actual}")]
    UnexpectedLoginId { expected: i32, actual: i32 },

    #[error("unexpected packet type {packet_type} (packet id {id})")]
    UnexpectedPacketType { id: i32, packet_type: i32 },

    #[error("unknown packet id {id}: expected {expected} or padding id {sentinel}")]
    UnknownPacketId {
        id: i32,
        expected: i32,
        sentinel: i32,
    },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("packet id space exhausted")]
    IdsExhausted,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Returns whether the server broke the id/type correlation contract,
    /// which usually means the session is desynchronized.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ClientError::UnexpectedLoginId { .. }
                | ClientError::UnexpectedPacketType { .. }
                | ClientError::UnknownPacketId { .. }
                | ClientError::Protocol(mcrcon_protocol::ProtocolError::InvalidLength(_))
                | ClientError::Protocol(mcrcon_protocol::ProtocolError::PacketTooLarge { .. })
        )
    }
}
