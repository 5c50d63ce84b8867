//! Atomic file operations for sync.
//!
//! Deck files and snapshots are only ever replaced whole: write to a temp
//! file next to the target, fsync, then rename over it. A crash leaves either
//! the old file or the new one, never a truncated one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::Card;
use crate::sync::codec;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("mochi"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` appended)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read and parse a deck file.
///
/// # Errors
///
/// Returns [`Error::Format`] on malformed content, or an I/O error.
pub fn read_deck_file(path: &Path) -> Result<Vec<Card>> {
    let text = fs::read_to_string(path)?;
    codec::parse(&text).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize cards and atomically replace the deck file.
///
/// # Errors
///
/// Returns [`Error::Format`] if a card cannot be represented in the file
/// format, or an I/O error.
pub fn write_deck_file(path: &Path, cards: &[Card]) -> Result<()> {
    codec::ensure_serializable(cards).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &codec::serialize(cards))
}

/// Generate .gitignore content for the sync state directory.
///
/// Snapshots are machine state, rebuilt by the next `pull`; none of it
/// belongs in the user's history.
#[must_use]
pub fn gitignore_content() -> &'static str {
    "# mochi sync state (snapshots of the last synced remote deck)\n*\n"
}

/// Ensure .gitignore exists in the state directory.
///
/// If the file already exists, it is not modified (user may have customized it).
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn ensure_gitignore(state_dir: &Path) -> Result<()> {
    let gitignore_path = state_dir.join(".gitignore");

    if gitignore_path.exists() {
        return Ok(());
    }

    fs::create_dir_all(state_dir)?;

    let mut file = File::create(&gitignore_path)?;
    file.write_all(gitignore_content().as_bytes())?;
    file.sync_all()?;

    Ok(())
}
