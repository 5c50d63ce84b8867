//! Last-synced deck state, the merge base for three-way diffs.
//!
//! One JSON file per deck under a hidden `.mochi-sync/` directory beside the
//! deck files. A missing snapshot means no remote cards were known before,
//! which is the correct base for a deck's first sync.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Card;
use crate::sync::file::{atomic_write, ensure_gitignore};

/// Name of the hidden state directory.
pub const STATE_DIR: &str = ".mochi-sync";

/// Remote deck state as of the last successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub deck_id: String,
    pub deck_name: String,
    pub synced_at: DateTime<Utc>,
    pub cards: Vec<Card>,
}

impl Snapshot {
    #[must_use]
    pub fn new(deck_id: impl Into<String>, deck_name: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            deck_id: deck_id.into(),
            deck_name: deck_name.into(),
            synced_at: Utc::now(),
            cards,
        }
    }
}

/// Reads and commits snapshots for the decks of one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    state_dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at an explicit state directory.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Store for the deck files in `deck_dir`.
    #[must_use]
    pub fn for_deck_dir(deck_dir: &Path) -> Self {
        Self::new(deck_dir.join(STATE_DIR))
    }

    /// Store for the directory containing `deck_file`.
    #[must_use]
    pub fn for_deck_file(deck_file: &Path) -> Self {
        let dir = deck_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::for_deck_dir(dir)
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn path_for(&self, deck_id: &str) -> PathBuf {
        self.state_dir.join(format!("{deck_id}.json"))
    }

    /// Load the snapshot for a deck, if one was ever committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed. A
    /// corrupt snapshot is never silently replaced by an empty one.
    pub fn load(&self, deck_id: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(deck_id);
        if !path.exists() {
            debug!(deck_id, "No snapshot yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            Error::Other(format!("Corrupt sync snapshot {}: {e}", path.display()))
        })?;
        if snapshot.deck_id != deck_id {
            return Err(Error::Other(format!(
                "Sync snapshot {} belongs to deck {}",
                path.display(),
                snapshot.deck_id
            )));
        }
        Ok(Some(snapshot))
    }

    /// Cards of the last snapshot, or none before the first sync.
    ///
    /// # Errors
    ///
    /// See [`SnapshotStore::load`].
    pub fn load_cards(&self, deck_id: &str) -> Result<Vec<Card>> {
        Ok(self.load(deck_id)?.map(|s| s.cards).unwrap_or_default())
    }

    /// Atomically replace the snapshot for `snapshot.deck_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory or file cannot be written.
    pub fn commit(&self, snapshot: &Snapshot) -> Result<()> {
        ensure_gitignore(&self.state_dir)?;
        let content = serde_json::to_string_pretty(snapshot)?;
        atomic_write(&self.path_for(&snapshot.deck_id), &content)?;
        debug!(
            deck_id = %snapshot.deck_id,
            cards = snapshot.cards.len(),
            "Committed snapshot"
        );
        Ok(())
    }
}
