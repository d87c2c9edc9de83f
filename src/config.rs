//! Password file.
//!
//! Passwords are looked up in `~/.mcrcon/pass` unless another file or inline
//! text is given on the command line. Each line is either
//! `host:port:password` or `port:password`; blank lines and `#` comments are
//! skipped.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Directory under the home directory holding the password file.
pub const CONFIG_DIR: &str = ".mcrcon";

/// Password file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "pass";

/// Passwords keyed by `host:port` or by port alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordConfig {
    entries: HashMap<String, String>,
}

impl PasswordConfig {
    /// Returns `~/.mcrcon/pass`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        home::home_dir()
            .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::HomeDirUnavailable)
    }

    /// Loads the password file from its default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file(Self::default_path()?)
    }

    /// Loads a password file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied(path.to_path_buf()),
            _ => ConfigError::IoError(path.to_path_buf(), e),
        })?;
        Self::parse(&content)
    }

    /// Parses password file contents.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut entries = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            // Fields are kept as written; a password may end in whitespace.
            let fields: Vec<&str> = line.split(':').collect();
            let (key, password) = match fields.as_slice() {
                [port, password] => (port.to_string(), *password),
                [host, port, password] => (format!("{}:{}", host, port), *password),
                _ => return Err(ConfigError::ParseError { line: index + 1 }),
            };
            entries.insert(key, password.to_string());
        }

        if entries.is_empty() {
            return Err(ConfigError::NoConfig);
        }
        Ok(Self { entries })
    }

    /// Looks up a password by exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Finds the password for `host:port`, falling back to the port alone.
    pub fn password_for(&self, address: &str) -> Option<&str> {
        self.get(address).or_else(|| {
            address
                .rsplit_once(':')
                .and_then(|(_, port)| self.get(port))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Password file error.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    PermissionDenied(PathBuf),
    IoError(PathBuf, io::Error),
    HomeDirUnavailable,
    ParseError { line: usize },
    NoConfig,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "password file '{}' not found", path.display())
            }
            ConfigError::PermissionDenied(path) => {
                write!(
                    f,
                    "permission denied when reading password file '{}'",
                    path.display()
                )
            }
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read password file '{}': {}", path.display(), e)
            }
            ConfigError::HomeDirUnavailable => {
                write!(f, "home directory not found")
            }
            ConfigError::ParseError { line } => {
                write!(f, "failed to parse password config at line {}", line)
            }
            ConfigError::NoConfig => write!(f, "no entries in password config"),
        }
    }
}

impl std::error::Error for ConfigError {}
