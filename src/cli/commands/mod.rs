//! Command implementations.

pub mod completions;
pub mod curate;
pub mod decks;
pub mod dedupe;
pub mod prompt;
pub mod pull;
pub mod sync;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::remote::MochiClient;

/// Flags every command sees.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub yes: bool,
    pub dry_run: bool,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn from_cli(cli: &Cli, json: bool) -> Self {
        Self {
            config: cli.config.clone(),
            yes: cli.yes,
            dry_run: cli.dry_run,
            json,
            quiet: cli.quiet,
        }
    }

    /// Whether human-readable progress should be printed.
    #[must_use]
    pub fn human(&self) -> bool {
        !self.json && !self.quiet
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref())
    }
}

/// Build the async runtime used to drive remote calls.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| Error::Other(format!("Failed to create runtime: {e}")))
}

/// Mochi client for the resolved config, asking for the API key on a
/// terminal if none is configured.
pub(crate) fn mochi_client(config: &mut Config) -> Result<MochiClient> {
    if config.mochi_api_key.is_none() && io::stdin().is_terminal() && io::stderr().is_terminal() {
        eprint!("Mochi API key (https://app.mochi.cards/settings): ");
        io::stderr().flush()?;

        let mut key = String::new();
        io::stdin().read_line(&mut key)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::Config("Mochi API key not configured".into()));
        }
        config.save_mochi_api_key(key)?;
        if let Some(path) = &config.path {
            eprintln!("Saved API key to {}", path.display());
        }
    }
    MochiClient::new(config)
}
