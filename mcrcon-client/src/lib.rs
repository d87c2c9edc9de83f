//! # mcrcon-client
//!
//! Client library for RCON servers.
//!
//! This crate provides:
//! - Async TCP session with strictly sequential packet exchange
//! - Password login handshake
//! - Collection of multi-packet command responses
//! - Packet id generation

pub mod client;
pub mod collector;
pub mod connection;
pub mod error;
pub mod ids;

pub use client::Client;
pub use collector::{ExchangeState, Progress, ResponseCollector, SENTINEL_OFFSET};
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
pub use ids::PacketIdGenerator;
pub use mcrcon_protocol::DEFAULT_PORT;
