//! Connection management.

use crate::collector::{Progress, ResponseCollector};
use crate::error::ClientError;
use crate::ids::PacketIdGenerator;
use mcrcon_protocol::{Decoder, Packet};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default read buffer size (4 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024;

/// Minimum read buffer size.
pub const MIN_READ_BUFFER_SIZE: usize = 64;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Default pause between a command and its padding packet.
pub const DEFAULT_PADDING_DELAY: Duration = Duration::from_millis(1);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address as `host:port`.
    pub addr: String,
    /// Pause before the padding packet is sent. Some servers drop or reorder
    /// the padding packet when it arrives before the command has been processed.
    pub padding_delay: Duration,
    /// Read buffer size for socket reads.
    pub read_buffer_size: usize,
    /// Largest packet accepted from the server, length prefix included.
    /// Unbounded when `None`.
    pub max_packet_size: Option<usize>,
}

impl ConnectionConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            padding_delay: DEFAULT_PADDING_DELAY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_packet_size: None,
        }
    }

    pub fn with_padding_delay(mut self, delay: Duration) -> Self {
        self.padding_delay = delay;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = Some(size);
        self
    }
}

/// A session with an RCON server.
///
/// Every operation runs its writes and reads in strict sequence; one command
/// exchange must finish before the next starts.
pub struct Connection<S = TcpStream> {
    config: ConnectionConfig,
    stream: S,
    /// Decoder holding bytes read past the last complete packet.
    decoder: Decoder,
    read_buf: Vec<u8>,
    ids: Arc<PacketIdGenerator>,
    authenticated: bool,
}

impl Connection<TcpStream> {
    /// Opens a TCP connection to `config.addr`.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!("Connecting to {}...", config.addr);

        let stream = TcpStream::connect(config.addr.as_str())
            .await
            .map_err(|source| {
                tracing::debug!("Connection failed: {}", source);
                ClientError::Connect {
                    addr: config.addr.clone(),
                    source,
                }
            })?;

        stream.set_nodelay(true).ok();
        tracing::debug!("TCP connected to {}", config.addr);

        Ok(Self::from_stream(stream, config))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already established stream.
    pub fn from_stream(stream: S, config: ConnectionConfig) -> Self {
        let read_buf = vec![0u8; config.read_buffer_size];
        let decoder = match config.max_packet_size {
            Some(max) => Decoder::new().with_max_packet_size(max),
            None => Decoder::new(),
        };
        Self {
            config,
            stream,
            decoder,
            read_buf,
            ids: Arc::new(PacketIdGenerator::new()),
            authenticated: false,
        }
    }

    /// Uses a shared id generator instead of a private one.
    pub fn with_id_generator(mut self, ids: Arc<PacketIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns whether login has succeeded on this connection.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn next_id(&self) -> Result<i32, ClientError> {
        self.ids.next().ok_or(ClientError::IdsExhausted)
    }

    /// Encodes and writes one packet.
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<(), ClientError> {
        let encoded = packet.encode()?;
        tracing::debug!(
            "Sending packet id={} type={} ({} bytes)",
            packet.id,
            packet.packet_type.as_i32(),
            encoded.len()
        );

        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads the next complete packet.
    ///
    /// End of stream before a length field is `ConnectionClosed`; end of
    /// stream partway through a packet is `TruncatedPacket`.
    pub async fn recv_packet(&mut self) -> Result<Packet, ClientError> {
        loop {
            if let Some(packet) = self.decoder.decode_packet()? {
                tracing::debug!(
                    "Received packet id={} type={} ({} payload bytes)",
                    packet.id,
                    packet.packet_type.as_i32(),
                    packet.payload.len()
                );
                return Ok(packet);
            }

            let n = match self.stream.read(&mut self.read_buf).await {
                Ok(n) => n,
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Read failed: {}", e);
                    0
                }
                Err(e) => return Err(ClientError::Io(e)),
            };

            if n == 0 {
                return Err(match self.decoder.pending_packet_size()? {
                    Some(expected) => {
                        let received = self.decoder.buffered();
                        tracing::debug!(
                            "Connection closed mid-packet ({} of {} bytes)",
                            received,
                            expected
                        );
                        ClientError::TruncatedPacket { expected, received }
                    }
                    None => {
                        tracing::debug!("Connection closed");
                        ClientError::ConnectionClosed
                    }
                });
            }

            self.decoder.extend(&self.read_buf[..n]);
        }
    }

    /// Performs the login handshake with a single packet exchange.
    ///
    /// A failed login is terminal for this connection.
    pub async fn login(&mut self, password: &str) -> Result<(), ClientError> {
        let id = self.next_id()?;
        tracing::debug!("Sending login request id={}", id);
        self.send_packet(&Packet::login(id, password)).await?;

        let reply = self.recv_packet().await?;
        if reply.id == -1 {
            tracing::debug!("Login rejected by server");
            return Err(ClientError::AuthenticationFailed);
        }
        if reply.id != id {
            return Err(ClientError::UnexpectedLoginId {
                expected: id,
                actual: reply.id,
            });
        }

        self.authenticated = true;
        tracing::debug!("Login successful");
        Ok(())
    }

    /// Sends a command and collects its complete response text.
    pub async fn command(&mut self, command: &str) -> Result<String, ClientError> {
        if !self.authenticated {
            return Err(ClientError::NotAuthenticated);
        }

        let id = self.next_id()?;
        let mut collector = ResponseCollector::new(id);

        tracing::debug!("Sending command id={}", id);
        self.send_packet(&Packet::command(id, command)).await?;

        if !self.config.padding_delay.is_zero() {
            tokio::time::sleep(self.config.padding_delay).await;
        }
        self.send_packet(&Packet::padding(collector.sentinel_id()))
            .await
            .map_err(|e| collector.abort(e))?;

        loop {
            let packet = self
                .recv_packet()
                .await
                .map_err(|e| collector.abort(e))?;

            if let Progress::Complete(response) = collector.accept(packet)? {
                tracing::debug!(
                    "Command id={} complete ({} fragments, {} bytes)",
                    id,
                    collector.fragments(),
                    response.len()
                );
                return Ok(response);
            }
        }
    }

    /// Shuts down the write side of the stream.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Closing connection...");
        self.authenticated = false;
        self.decoder.clear();
        self.stream.shutdown().await?;
        Ok(())
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::sentinel_id;
    use mcrcon_protocol::PacketType;
    use tokio_test::io::{Builder, Mock};

    fn wire(packet: Packet) -> Vec<u8> {
        packet.encode().unwrap().to_vec()
    }

    fn test_config() -> ConnectionConfig {
        ConnectionConfig::new("test:25575").with_padding_delay(Duration::ZERO)
    }

    fn connection(mock: Mock) -> Connection<Mock> {
        Connection::from_stream(mock, test_config())
    }

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::new("127.0.0.1:25575");
        assert_eq!(config.addr, "127.0.0.1:25575");
        assert_eq!(config.padding_delay, Duration::from_millis(1));
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(config.max_packet_size, None);
    }

    #[test]
    fn test_config_buffer_clamping() {
        let config = ConnectionConfig::new("localhost:25575").with_read_buffer_size(1);
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);

        let config =
            ConnectionConfig::new("localhost:25575").with_read_buffer_size(10 * 1024 * 1024);
        assert_eq!(config.read_buffer_size, MAX_READ_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn test_login_success() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "secret")))
            .read(&wire(Packet::new(1, PacketType::Command, "")))
            .build();

        let mut conn = connection(mock);
        assert!(!conn.is_authenticated());
        conn.login("secret").await.unwrap();
        assert!(conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "nope")))
            .read(&wire(Packet::new(-1, PacketType::Command, "")))
            .build();

        let mut conn = connection(mock);
        let err = conn.login("nope").await.unwrap_err();
        assert!(matches!(err, ClientError::AuthenticationFailed));
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_mismatched_id() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "secret")))
            .read(&wire(Packet::new(42, PacketType::Command, "")))
            .build();

        let mut conn = connection(mock);
        let err = conn.login("secret").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedLoginId {
                expected: 1,
                actual: 42
            }
        ));
        assert!(err.is_protocol_violation());
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_oversized_packet_rejected() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "secret")))
            .read(&0x7FFF_FFFFi32.to_le_bytes())
            .build();

        let config = test_config().with_max_packet_size(4096);
        let mut conn = Connection::from_stream(mock, config);
        let err = conn.login("secret").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(mcrcon_protocol::ProtocolError::PacketTooLarge {
                max: 4096,
                ..
            })
        ));
        assert!(err.is_protocol_violation());
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_command_requires_login() {
        let mut conn = connection(Builder::new().build());
        let err = conn.command("list").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_command_exchange() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "pw")))
            .read(&wire(Packet::new(1, PacketType::Command, "")))
            .write(&wire(Packet::command(2, "help")))
            .write(&wire(Packet::padding(sentinel_id(2))))
            .read(&wire(Packet::new(2, PacketType::Response, "Hello, ")))
            .read(&wire(Packet::new(2, PacketType::Response, "world!")))
            .read(&wire(Packet::padding(sentinel_id(2))))
            .build();

        let mut conn = connection(mock);
        conn.login("pw").await.unwrap();
        let response = conn.command("help").await.unwrap();
        assert_eq!(response, "Hello, world!");
    }

    #[tokio::test]
    async fn test_command_fragments_in_one_read() {
        let mut replies = wire(Packet::new(2, PacketType::Response, "a"));
        replies.extend(wire(Packet::new(2, PacketType::Response, "b")));
        replies.extend(wire(Packet::padding(sentinel_id(2))));

        let mock = Builder::new()
            .write(&wire(Packet::login(1, "pw")))
            .read(&wire(Packet::new(1, PacketType::Command, "")))
            .write(&wire(Packet::command(2, "seed")))
            .write(&wire(Packet::padding(sentinel_id(2))))
            .read(&replies)
            .build();

        let mut conn = connection(mock);
        conn.login("pw").await.unwrap();
        assert_eq!(conn.command("seed").await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_command_unexpected_type() {
        let mock = Builder::new()
            .write(&wire(Packet::login(1, "pw")))
            .read(&wire(Packet::new(1, PacketType::Command, "")))
            .write(&wire(Packet::command(2, "list")))
            .write(&wire(Packet::padding(sentinel_id(2))))
            .read(&wire(Packet::new(2, PacketType::Response, "buffered")))
            .read(&wire(Packet::new(2, PacketType::Other(1), "")))
            .build();

        let mut conn = connection(mock);
        conn.login("pw").await.unwrap();
        let err = conn.command("list").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedPacketType { packet_type: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_recv_connection_closed() {
        let mut conn = connection(Builder::new().build());
        let err = conn.recv_packet().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_recv_partial_length_is_closed() {
        let mut conn = connection(Builder::new().read(&[14, 0]).build());
        let err = conn.recv_packet().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_recv_truncated_packet() {
        let full = wire(Packet::new(3, PacketType::Response, "cut off"));
        let mut conn = connection(Builder::new().read(&full[..9]).build());

        let err = conn.recv_packet().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::TruncatedPacket {
                expected,
                received: 9
            } if expected == full.len()
        ));
    }

    #[tokio::test]
    async fn test_recv_reset_is_closed() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut conn = connection(mock);
        let err = conn.recv_packet().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_recv_invalid_length() {
        let mut conn = connection(Builder::new().read(&[2, 0, 0, 0]).build());
        let err = conn.recv_packet().await.unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[tokio::test]
    async fn test_shared_id_generator() {
        let ids = Arc::new(PacketIdGenerator::new());
        ids.next().unwrap();
        ids.next().unwrap();

        let mock = Builder::new()
            .write(&wire(Packet::login(3, "pw")))
            .read(&wire(Packet::new(3, PacketType::Command, "")))
            .build();

        let mut conn = connection(mock).with_id_generator(ids.clone());
        conn.login("pw").await.unwrap();
        assert_eq!(ids.last(), 3);
    }
}
