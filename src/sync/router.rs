//! Deck file naming.
//!
//! Existing decks live in `deck-<slug>-<deck_id>.md`; a deck that has never
//! been pushed lives in `deck-<slug>.md` and is renamed once the remote deck
//! is created.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::remote::RemoteDeck;

const PREFIX: &str = "deck-";
const EXTENSION: &str = "md";

/// Mochi deck ids are 8 alphanumeric characters with mixed case.
const REMOTE_ID_LEN: usize = 8;

/// Turn a deck name into a filename-safe slug.
///
/// Drops anything that is not a word character, whitespace or hyphen,
/// collapses runs of whitespace and hyphens into one hyphen, trims hyphens
/// and lowercases.
#[must_use]
pub fn slug(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut pending_hyphen = false;
    for c in kept.chars() {
        if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        } else {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Filename for a deck, with or without its remote id.
#[must_use]
pub fn deck_filename(name: &str, remote_id: Option<&str>) -> String {
    match remote_id {
        Some(id) => format!("{PREFIX}{}-{id}.{EXTENSION}", slug(name)),
        None => format!("{PREFIX}{}.{EXTENSION}", slug(name)),
    }
}

fn looks_like_remote_id(segment: &str) -> bool {
    segment.len() == REMOTE_ID_LEN
        && segment.chars().all(|c| c.is_ascii_alphanumeric())
        && segment.chars().any(|c| c.is_ascii_uppercase())
        && segment.chars().any(|c| c.is_ascii_lowercase())
}

fn deck_stem(path: &Path) -> Result<&str> {
    let invalid = || {
        Error::InvalidArgument(format!(
            "Invalid deck filename: expected deck-<name>-<deck_id>.md or deck-<name>.md, got {}",
            path.display()
        ))
    };

    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return Err(invalid());
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    match stem.strip_prefix(PREFIX) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(invalid()),
    }
}

/// Extract the remote deck id from a deck filename.
///
/// Returns `Ok(None)` for the no-id form of a new deck.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the name is not a deck filename.
pub fn extract_remote_id(path: &Path) -> Result<Option<String>> {
    let rest = deck_stem(path)?;
    Ok(rest
        .rsplit_once('-')
        .map(|(_, last)| last)
        .filter(|last| looks_like_remote_id(last))
        .map(str::to_string))
}

/// Deck name encoded in a filename: the stem without prefix or id.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the name is not a deck filename.
pub fn deck_name_from_path(path: &Path) -> Result<String> {
    let rest = deck_stem(path)?;
    Ok(match extract_remote_id(path)? {
        Some(id) => rest
            .strip_suffix(id.as_str())
            .and_then(|r| r.strip_suffix('-'))
            .unwrap_or(rest)
            .to_string(),
        None => rest.to_string(),
    })
}

/// Path a deck file moves to once its remote id is known.
#[must_use]
pub fn renamed_path(path: &Path, name: &str, remote_id: &str) -> PathBuf {
    path.with_file_name(deck_filename(name, Some(remote_id)))
}

/// All `deck-*.md` files in a directory, sorted.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn find_deck_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && deck_stem(p).is_ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Find a deck by exact id, exact name, or case-insensitive name fragment.
#[must_use]
pub fn find_deck<'a>(decks: &'a [RemoteDeck], query: &str) -> Option<&'a RemoteDeck> {
    let lowered = query.to_lowercase();
    decks
        .iter()
        .find(|d| d.id == query)
        .or_else(|| decks.iter().find(|d| d.name == query))
        .or_else(|| decks.iter().find(|d| d.name.to_lowercase().contains(&lowered)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Python Basics"), "python-basics");
        assert_eq!(slug("AI/ML  Notes!"), "aiml-notes");
        assert_eq!(slug("--Rust -- Ownership--"), "rust-ownership");
        assert_eq!(slug("snake_case deck"), "snake_case-deck");
    }

    #[test]
    fn test_deck_filename() {
        assert_eq!(deck_filename("Python Basics", Some("AbCdEfGh")), "deck-python-basics-AbCdEfGh.md");
        assert_eq!(deck_filename("foo", None), "deck-foo.md");
    }

    #[test]
    fn test_extract_remote_id_valid() {
        let id = extract_remote_id(Path::new("deck-python-AbCd1234.md")).unwrap();
        assert_eq!(id.as_deref(), Some("AbCd1234"));
    }

    #[test]
    fn test_extract_remote_id_new_deck() {
        assert_eq!(extract_remote_id(Path::new("deck-foo.md")).unwrap(), None);
    }

    #[test]
    fn test_extract_remote_id_hyphenated_name() {
        assert_eq!(extract_remote_id(Path::new("deck-my-new-deck.md")).unwrap(), None);
        let id = extract_remote_id(Path::new("dir/deck-my-new-deck-XyZ98765.md")).unwrap();
        assert_eq!(id.as_deref(), Some("XyZ98765"));
    }

    #[test]
    fn test_extract_remote_id_rejects_single_case() {
        assert_eq!(extract_remote_id(Path::new("deck-notes-abcdefgh.md")).unwrap(), None);
        assert_eq!(extract_remote_id(Path::new("deck-notes-ABCDEFGH.md")).unwrap(), None);
    }

    #[test]
    fn test_extract_remote_id_invalid_names() {
        assert!(extract_remote_id(Path::new("python-AbCd1234.md")).is_err());
        assert!(extract_remote_id(Path::new("deck-.md")).is_err());
        assert!(extract_remote_id(Path::new("deck-foo.txt")).is_err());
    }

    #[test]
    fn test_deck_name_from_path() {
        assert_eq!(deck_name_from_path(Path::new("deck-foo.md")).unwrap(), "foo");
        assert_eq!(
            deck_name_from_path(Path::new("deck-python-basics-AbCd1234.md")).unwrap(),
            "python-basics"
        );
    }

    #[test]
    fn test_renamed_path_keeps_directory() {
        let path = Path::new("/tmp/decks/deck-foo.md");
        assert_eq!(
            renamed_path(path, "foo", "xyz"),
            PathBuf::from("/tmp/decks/deck-foo-xyz.md")
        );
    }

    #[test]
    fn test_find_deck_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deck-b.md"), "").unwrap();
        fs::write(dir.path().join("deck-a-AbCd1234.md"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        fs::write(dir.path().join("deck-c.txt"), "").unwrap();

        let files = find_deck_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["deck-a-AbCd1234.md", "deck-b.md"]);
    }

    #[test]
    fn test_find_deck() {
        let decks = vec![
            RemoteDeck { id: "deck1".into(), name: "Python Basics".into() },
            RemoteDeck { id: "deck2".into(), name: "AI/ML Notes".into() },
        ];
        assert_eq!(find_deck(&decks, "deck2").unwrap().name, "AI/ML Notes");
        assert_eq!(find_deck(&decks, "Python Basics").unwrap().id, "deck1");
        assert_eq!(find_deck(&decks, "python").unwrap().id, "deck1");
        assert!(find_deck(&decks, "Nonexistent").is_none());
    }
}
