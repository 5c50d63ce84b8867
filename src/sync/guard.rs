//! Duplicate detection before remote creates.

use std::collections::HashMap;

use crate::model::Card;

/// Fingerprint index over the live remote deck.
///
/// Built once per sync invocation; lookups are O(1). Cards created during
/// the run are recorded so a second identical local card is caught too.
#[derive(Debug, Clone, Default)]
pub struct DuplicateGuard {
    by_fingerprint: HashMap<String, String>,
    enabled: bool,
}

impl DuplicateGuard {
    /// Index the given remote cards. Cards without an id are ignored.
    #[must_use]
    pub fn new(remote_cards: &[Card]) -> Self {
        let mut guard = Self {
            by_fingerprint: HashMap::with_capacity(remote_cards.len()),
            enabled: true,
        };
        for card in remote_cards {
            guard.record(card);
        }
        guard
    }

    /// A guard that never reports a match (`--force`).
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Return the id of an existing remote card with the same content.
    #[must_use]
    pub fn would_duplicate(&self, card: &Card) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.by_fingerprint
            .get(&card.fingerprint())
            .map(String::as_str)
    }

    /// Register a remote card, typically one just created.
    ///
    /// The first card seen for a fingerprint wins.
    pub fn record(&mut self, card: &Card) {
        if let Some(id) = &card.remote_id {
            self.by_fingerprint
                .entry(card.fingerprint())
                .or_insert_with(|| id.clone());
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_content_duplicate() {
        let remote = vec![Card::new("What is X?", "X is Y").with_id("AbCdEfGh")];
        let guard = DuplicateGuard::new(&remote);

        let local = Card::new("What is X?", "X is Y");
        assert_eq!(guard.would_duplicate(&local), Some("AbCdEfGh"));

        let other = Card::new("What is X?", "X is Z");
        assert_eq!(guard.would_duplicate(&other), None);
    }

    #[test]
    fn test_match_ignores_tags_and_whitespace() {
        let remote = vec![Card::new("Q", "A").with_id("AbCdEfGh")];
        let guard = DuplicateGuard::new(&remote);
        let local = Card::new(" Q\n", "A ").with_tags(["extra"]);
        assert!(guard.would_duplicate(&local).is_some());
    }

    #[test]
    fn test_disabled_guard() {
        let guard = DuplicateGuard::disabled();
        assert!(!guard.is_enabled());
        assert_eq!(guard.would_duplicate(&Card::new("Q", "A")), None);
    }

    #[test]
    fn test_record_created_card() {
        let mut guard = DuplicateGuard::new(&[]);
        let created = Card::new("Q", "A").with_id("NewCard1");
        guard.record(&created);
        assert_eq!(guard.would_duplicate(&Card::new("Q", "A")), Some("NewCard1"));
    }

    #[test]
    fn test_first_id_wins() {
        let remote = vec![
            Card::new("Q", "A").with_id("First111"),
            Card::new("Q", "A").with_id("Second22"),
        ];
        let guard = DuplicateGuard::new(&remote);
        assert_eq!(guard.would_duplicate(&Card::new("Q", "A")), Some("First111"));
    }
}
