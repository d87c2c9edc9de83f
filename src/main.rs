//! mcrcon - RCON command-line client
//!
//! Logs in to an RCON server, runs one command and prints the response.

mod config;
mod target;

use clap::Parser;
use colored::Colorize;
use mcrcon_client::{Client, DEFAULT_PORT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mcrcon")]
#[command(about = "Run a command on a server over RCON")]
#[command(version)]
pub struct Cli {
    /// Server address (host or host:port); overrides --hostname and --port
    #[arg(short, long)]
    pub address: Option<String>,

    /// Server hostname
    #[arg(short = 'n', long, default_value = "localhost")]
    pub hostname: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// RCON password; overrides the password file
    #[arg(short = 's', long, env = "MCRCON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Path to the password file (defaults to ~/.mcrcon/pass)
    #[arg(short = 'f', long, value_parser = config_path)]
    pub config_file: Option<PathBuf>,

    /// Password file contents given inline; overrides --config-file
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Pause before the end-of-response padding packet, in milliseconds
    #[arg(long, default_value_t = 1)]
    pub padding_delay_ms: u64,

    /// Command to run
    #[arg(required = true, trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Unlike clap's default path parser this accepts an empty value, which then
/// falls back to the default password file.
fn config_path(value: &str) -> Result<PathBuf, std::convert::Infallible> {
    Ok(PathBuf::from(value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let target = match target::resolve(&cli) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    let result = Client::run_with_timeout(
        target.connection_config(),
        &target.password,
        &target.command,
        target.timeout,
    )
    .await;

    match result {
        Ok(response) => {
            println!("{}", response);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
