//! Deck file validation and name suggestions.
//!
//! Every push or sync validates the whole local file before the first remote
//! call, so a malformed deck never causes a partial upload.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::Card;
use crate::sync::codec::{self, FormatError};

/// Read, parse and structurally check a deck file.
///
/// Checks, in order: the file is not blank, it parses, it holds at least one
/// card, every question and answer is non-empty, and no two cards share a
/// `card_id`. Card numbers in errors are 1-based.
///
/// # Errors
///
/// Returns [`Error::Format`] naming the first problem, or an I/O error.
pub fn validate_deck_file(path: &Path) -> Result<Vec<Card>> {
    let text = fs::read_to_string(path)?;
    validate_deck_text(&text).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// [`validate_deck_file`] on text already in memory.
///
/// # Errors
///
/// Returns the first [`FormatError`] found.
pub fn validate_deck_text(text: &str) -> std::result::Result<Vec<Card>, FormatError> {
    if text.trim().is_empty() {
        return Err(FormatError::EmptyFile);
    }

    let cards = codec::parse(text)?;
    if cards.is_empty() {
        return Err(FormatError::NoCards);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (idx, card) in cards.iter().enumerate() {
        let number = idx + 1;
        if card.question.trim().is_empty() {
            return Err(FormatError::EmptyField {
                card: number,
                field: "question",
            });
        }
        if card.answer.trim().is_empty() {
            return Err(FormatError::EmptyField {
                card: number,
                field: "answer",
            });
        }
        if let Some(id) = card.remote_id.as_deref() {
            if let Some(&first) = seen.get(id) {
                return Err(FormatError::DuplicateId {
                    id: id.to_string(),
                    first,
                    second: number,
                });
            }
            seen.insert(id, number);
        }
    }

    Ok(cards)
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Use single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Find deck names or ids close to what the user typed.
///
/// Comparison is case-insensitive. Returns up to `max` suggestions with edit
/// distance ≤ 3, sorted by distance then alphabetically.
#[must_use]
pub fn find_similar<'a>(searched: &str, candidates: &[&'a str], max: usize) -> Vec<&'a str> {
    let searched = searched.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| (levenshtein_distance(&searched, &c.to_lowercase()), *c))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    scored.into_iter().take(max).map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = "---\ncard_id: AbCd1234\n---\nQ1\n---\nA1\n---\ncard_id: null\n---\nQ2\n---\nA2\n";

    #[test]
    fn test_valid_deck() {
        let cards = validate_deck_text(VALID).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].remote_id.as_deref(), Some("AbCd1234"));
        assert_eq!(cards[1].remote_id, None);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(validate_deck_text(" \n\n"), Err(FormatError::EmptyFile));
    }

    #[test]
    fn test_empty_answer() {
        let text = "---\ncard_id: null\n---\nQ1\n---\n   \n";
        assert_eq!(
            validate_deck_text(text),
            Err(FormatError::EmptyField {
                card: 1,
                field: "answer"
            })
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let text = "---\ncard_id: AbCd1234\n---\nQ1\n---\nA1\n---\ncard_id: AbCd1234\n---\nQ2\n---\nA2\n";
        assert_eq!(
            validate_deck_text(text),
            Err(FormatError::DuplicateId {
                id: "AbCd1234".into(),
                first: 1,
                second: 2
            })
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        let text = "---\ncolour: red\n---\nQ\n---\nA\n";
        assert!(matches!(
            validate_deck_text(text),
            Err(FormatError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_validate_file_maps_to_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck-bad.md");
        fs::write(&path, "").unwrap();
        let err = validate_deck_file(&path).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("deck-bad.md"));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_find_similar() {
        let names = ["Python Basics", "Rust", "Russian"];
        assert_eq!(find_similar("rsut", &names, 3), vec!["Rust"]);
        assert!(find_similar("Geography", &names, 3).is_empty());
    }
}
