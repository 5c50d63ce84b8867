//! Local-first deck synchronization.
//!
//! Deck files are the source of truth for content. A sync compares three
//! versions of a deck:
//!
//! - **Local**: the `deck-*.md` file
//! - **Base**: the snapshot taken at the end of the last successful run
//! - **Remote**: the live deck on the flashcard service
//!
//! Diffing local and remote against the base tells which side changed what.
//! Local changes always win; remote changes come down only under `sync`.
//!
//! # Layout
//!
//! ```text
//! decks/
//! ├── deck-rust-AbCd1234.md      # synced deck
//! ├── deck-new-topic.md          # never pushed, renamed on first push
//! └── .mochi-sync/
//!     ├── .gitignore
//!     └── AbCd1234.json          # base snapshot
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mochi::sync::{AutoPrompt, MergePolicy, SyncEngine, SyncOptions};
//!
//! let mut prompt = AutoPrompt::yes();
//! let mut engine = SyncEngine::new(&client, &mut prompt, SyncOptions::new(MergePolicy::Sync));
//! let report = engine.run(Path::new("deck-rust-AbCd1234.md")).await?;
//! ```

pub mod codec;
mod diff;
mod engine;
mod file;
mod guard;
mod hash;
mod prompt;
pub mod router;
mod snapshot;
mod types;

// Re-export main types and functions
pub use codec::FormatError;
pub use diff::{diff, CardDiff};
pub use engine::{build_plan, load_local_deck, pull_deck, SyncEngine, SyncOptions};
pub use file::{atomic_write, ensure_gitignore, gitignore_content, read_deck_file, write_deck_file};
pub use guard::DuplicateGuard;
pub use hash::{fingerprint, FINGERPRINT_LEN};
pub use prompt::{AutoPrompt, Prompt};
pub use snapshot::{Snapshot, SnapshotStore, STATE_DIR};
pub use types::{
    Conflict, DuplicateWarning, MergePolicy, NewCard, PullReport, SyncPhase, SyncPlan, SyncReport,
};
