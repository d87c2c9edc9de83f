//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use tokio::io::{AsyncRead, AsyncWrite};
use std::time::Duration;
use tokio::net::TcpStream;

/// High-level RCON client.
pub struct Client<S = TcpStream> {
    conn: Connection<S>,
}

impl Client<TcpStream> {
    /// Connects to the server described by `config`.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        Ok(Self {
            conn: Connection::connect(config).await?,
        })
    }

    /// Connects, logs in and runs a single command.
    pub async fn run(
        config: ConnectionConfig,
        password: &str,
        command: &str,
    ) -> Result<String, ClientError> {
        let mut client = Self::connect(config).await?;
        client.login(password).await?;
        let response = client.command(command).await?;

        if let Err(e) = client.close().await {
            tracing::debug!("Error while closing connection: {}", e);
        }
        Ok(response)
    }

    /// Like [`Client::run`], but gives up when the whole exchange takes
    /// longer than `timeout`. No limit applies when `timeout` is `None`.
    pub async fn run_with_timeout(
        config: ConnectionConfig,
        password: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<String, ClientError> {
        let exchange = Self::run(config, password, command);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                tracing::debug!("Exchange timed out after {:?}", limit);
                ClientError::Timeout(limit)
            })?,
            None => exchange.await,
        }
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client over an already established stream.
    pub fn from_stream(stream: S, config: ConnectionConfig) -> Self {
        Self {
            conn: Connection::from_stream(stream, config),
        }
    }

    /// Authenticates with the server.
    pub async fn login(&mut self, password: &str) -> Result<(), ClientError> {
        self.conn.login(password).await
    }

    /// Runs a command and returns the full response text.
    pub async fn command(&mut self, command: &str) -> Result<String, ClientError> {
        self.conn.command(command).await
    }

    /// Returns whether login has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.conn.is_authenticated()
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.conn.close().await
    }

    /// Returns the underlying connection.
    pub fn connection(&mut self) -> &mut Connection<S> {
        &mut self.conn
    }
}
