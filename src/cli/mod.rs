//! cli
//!
//! Command-line interface layer for lakehook.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and resolve the selected connection
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers build a [`LakeFsClient`] from the
//! [`Context`] and call the [`crate::store`] and [`crate::sensors`] APIs;
//! they hold no lakeFS logic of their own.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::store::LakeFsClient;
use crate::ui::output::Verbosity;

/// Shared state for command handlers.
#[derive(Debug)]
pub struct Context {
    /// Connection id selected with `--conn`
    pub conn_id: String,
    /// Loaded configuration
    pub config: Config,
    pub verbosity: Verbosity,
}

impl Context {
    /// Build a client for the selected connection.
    ///
    /// # Errors
    ///
    /// Fails when the connection id is unknown or its descriptor does not
    /// resolve to a host and credentials.
    pub fn client(&self) -> Result<LakeFsClient> {
        let connection = self.config.connection(&self.conn_id)?;
        let client = LakeFsClient::build(&connection)
            .with_context(|| format!("connection '{}' is not usable", self.conn_id))?;
        Ok(client.with_settings(self.config.client_settings()))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    // Completion needs neither config nor network
    if let args::Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let config = Config::load(cli.config.as_deref())?;
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let ctx = Context {
        conn_id: cli.conn_id,
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::dispatch(cli.command, &ctx))
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "lakehook=debug" } else { "lakehook=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
