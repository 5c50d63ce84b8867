//! Content fingerprinting for duplicate and change detection.
//!
//! A card's fingerprint is a SHA256 over its question and answer, so two cards
//! with equal fingerprints are content duplicates regardless of remote id.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Compute the fingerprint of a question/answer pair.
///
/// Leading and trailing whitespace of each part is ignored; interior
/// whitespace is significant so that genuine edits are never hidden.
#[must_use]
pub fn fingerprint(question: &str, answer: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(question.trim().as_bytes());
    hasher.update(b"\n---\n");
    hasher.update(answer.trim().as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let h1 = fingerprint("What is Rust?", "A language");
        let h2 = fingerprint("What is Rust?", "A language");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_fingerprint_ignores_outer_whitespace() {
        assert_eq!(
            fingerprint("Q", "A"),
            fingerprint("  Q\n", "A ")
        );
    }

    #[test]
    fn test_fingerprint_sees_interior_changes() {
        assert_ne!(fingerprint("Q", "a b"), fingerprint("Q", "a  b"));
        assert_ne!(fingerprint("Q", "A"), fingerprint("Q", "B"));
    }

    #[test]
    fn test_fingerprint_separates_question_and_answer() {
        assert_ne!(fingerprint("ab", "c"), fingerprint("a", "bc"));
    }
}
