//! Error types for the mochi CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (4=format, 5=consistency, 6=remote, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Every fatal error aborts the whole invocation before the sync snapshot is
//! committed, so re-running the command after fixing the cause is safe.

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::FormatError;

/// Result type alias for mochi operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Internal (exit 1)
    Aborted,
    InternalError,

    // Local deck file (exit 4)
    FormatError,
    InvalidArgument,

    // Local vs remote disagreement (exit 5)
    ConsistencyError,

    // Remote service (exit 6)
    RemoteCallError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Curation (exit 9)
    CurationError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Aborted => "ABORTED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::FormatError => "FORMAT_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConsistencyError => "CONSISTENCY_ERROR",
            Self::RemoteCallError => "REMOTE_CALL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::CurationError => "CURATION_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Aborted | Self::InternalError => 1,
            Self::FormatError | Self::InvalidArgument => 4,
            Self::ConsistencyError => 5,
            Self::RemoteCallError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::CurationError => 9,
        }
    }

    /// Whether re-running the same command unchanged may succeed.
    ///
    /// Only remote failures qualify: the snapshot is never committed after
    /// one, so the next run re-diffs against the last good state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteCallError)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in mochi operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed deck file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(
        "Data inconsistency: {} card(s) exist locally but not remotely: {}",
        missing.len(),
        missing.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>().join(", ")
    )]
    Consistency {
        /// (card id, question preview) of each card missing remotely.
        missing: Vec<(String, String)>,
    },

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("Remote call failed: {operation} returned HTTP {status}: {body}")]
    RemoteStatus {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Aborted")]
    Aborted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Curation error: {0}")]
    Curation(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteCall(err.to_string())
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Format { .. } => ErrorCode::FormatError,
            Self::Consistency { .. } => ErrorCode::ConsistencyError,
            Self::RemoteCall(_) | Self::RemoteStatus { .. } => ErrorCode::RemoteCallError,
            Self::Aborted => ErrorCode::Aborted,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Curation(_) => ErrorCode::CurationError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Format { path, .. } => Some(format!(
                "Fix the block in {} and re-run. Each card is:\n    ---\n    card_id: <id or null>\n    ---\n    question\n    ---\n    answer",
                path.display()
            )),

            Self::Consistency { missing } => {
                let mut hint = String::from("These cards were deleted remotely but still exist locally:\n");
                for (id, question) in missing.iter().take(10) {
                    hint.push_str(&format!("    {id}: {question}\n"));
                }
                if missing.len() > 10 {
                    hint.push_str(&format!("    ... and {} more\n", missing.len() - 10));
                }
                hint.push_str("  Use `mochi sync` instead of `mochi push` to remove them locally.");
                Some(hint)
            }

            Self::RemoteCall(_) | Self::RemoteStatus { .. } => Some(
                "Nothing was committed to the sync snapshot; re-run the command once the service responds."
                    .to_string(),
            ),

            Self::Config(msg) if msg.contains("Mochi API key") => Some(
                "Set MOCHI_API_KEY, or run any command in a terminal to be prompted for it. \
                 Keys live at https://app.mochi.cards/settings"
                    .to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("filename") => Some(
                "Deck files are named deck-<name>-<deck_id>.md, or deck-<name>.md for a deck not yet pushed."
                    .to_string(),
            ),

            Self::Config(_)
            | Self::InvalidArgument(_)
            | Self::Aborted
            | Self::Io(_)
            | Self::Json(_)
            | Self::Curation(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
