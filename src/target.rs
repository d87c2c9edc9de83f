//! Resolution of the server address, password and command from arguments.

use crate::config::{ConfigError, PasswordConfig};
use crate::Cli;
use mcrcon_client::{ConnectionConfig, DEFAULT_PORT};
use std::time::Duration;

/// Hostname used when none (or an empty one) is given.
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Everything needed for one login-then-command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: String,
    pub password: String,
    pub command: String,
    pub padding_delay: Duration,
    pub timeout: Option<Duration>,
}

impl Target {
    /// Connection settings for this target.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(&self.address).with_padding_delay(self.padding_delay)
    }
}

/// Argument resolution error.
#[derive(Debug)]
pub enum ArgsError {
    InvalidAddress(String),
    NoPassword,
    Config(ConfigError),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgsError::InvalidAddress(addr) => write!(f, "invalid address: {}", addr),
            ArgsError::NoPassword => write!(f, "no password provided"),
            ArgsError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ConfigError> for ArgsError {
    fn from(e: ConfigError) -> Self {
        ArgsError::Config(e)
    }
}

/// Resolves parsed arguments into a target.
pub fn resolve(cli: &Cli) -> Result<Target, ArgsError> {
    let address = resolve_address(cli.address.as_deref(), &cli.hostname, cli.port)?;

    let password = match cli.password.as_deref() {
        Some(password) if !password.is_empty() => password.to_string(),
        _ => {
            let config = load_password_config(cli)?;
            config
                .password_for(&address)
                .map(str::to_string)
                .ok_or(ArgsError::NoPassword)?
        }
    };

    Ok(Target {
        address,
        password,
        command: cli.command.join(" "),
        padding_delay: Duration::from_millis(cli.padding_delay_ms),
        timeout: cli.timeout.map(Duration::from_secs),
    })
}

/// Builds `host:port`. An explicit address wins over hostname and port and
/// gets the default port when it has none.
pub fn resolve_address(
    address: Option<&str>,
    hostname: &str,
    port: u16,
) -> Result<String, ArgsError> {
    match address {
        Some(address) if !address.is_empty() => match address.matches(':').count() {
            0 => Ok(format!("{}:{}", address, DEFAULT_PORT)),
            1 => Ok(address.to_string()),
            _ => Err(ArgsError::InvalidAddress(address.to_string())),
        },
        _ if hostname.is_empty() => Ok(format!("{}:{}", DEFAULT_HOSTNAME, port)),
        _ => Ok(format!("{}:{}", hostname, port)),
    }
}

/// Inline config wins over a config file path; both are errors when they
/// fail to load. Empty values count as not given. A missing default file
/// just yields no entries.
fn load_password_config(cli: &Cli) -> Result<PasswordConfig, ConfigError> {
    if let Some(text) = cli.config.as_deref().filter(|text| !text.is_empty()) {
        return PasswordConfig::parse(text);
    }
    if let Some(path) = cli
        .config_file
        .as_deref()
        .filter(|path| !path.as_os_str().is_empty())
    {
        return PasswordConfig::from_file(path);
    }

    match PasswordConfig::load_default() {
        Ok(config) => {
            tracing::debug!("Loaded {} password entries", config.len());
            Ok(config)
        }
        Err(e) => {
            tracing::debug!("No password file loaded: {}", e);
            Ok(PasswordConfig::default())
        }
    }
}
