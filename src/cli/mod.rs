//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::curation::dedupe::DEFAULT_THRESHOLD;
use crate::curation::grade::DEFAULT_MIN_SCORE;

pub mod commands;

/// mochi - keep markdown flashcard decks in sync with Mochi
#[derive(Parser, Debug)]
#[command(name = "mochi", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.mochi-sync/config.json)
    #[arg(long, global = true, env = "MOCHI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Show what would change without touching the remote or local files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List remote decks
    Decks,

    /// Download a remote deck into deck-<name>-<id>.md
    Pull {
        /// Deck id or name
        deck: String,
    },

    /// Upload local changes (remote changes are left alone)
    Push {
        /// Deck file (default: every deck-*.md in the current directory)
        file: Option<PathBuf>,

        /// Create cards even if an identical one already exists remotely
        #[arg(short, long)]
        force: bool,
    },

    /// Two-way sync: upload local changes and pull remote ones
    Sync {
        /// Deck file (default: every deck-*.md in the current directory)
        file: Option<PathBuf>,

        /// Create cards even if an identical one already exists remotely
        #[arg(short, long)]
        force: bool,
    },

    /// Find semantically duplicate cards and remove them from a deck file
    Dedupe {
        /// Deck file
        file: PathBuf,

        /// Cosine similarity threshold (0.0-1.0)
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
    },

    /// Grade cards with an LLM and archive the weak ones
    Curate {
        /// Deck file
        file: PathBuf,

        /// Archive cards scoring below this grade (0-10)
        #[arg(short, long, default_value_t = DEFAULT_MIN_SCORE)]
        threshold: u8,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
