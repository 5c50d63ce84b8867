//! Deck record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::card::{index_by_id, Card};

/// An ordered collection of cards plus deck-level metadata.
///
/// Sync identity is `remote_id`; `name` only drives filenames and fuzzy
/// lookup. A deck without a `remote_id` has not been created remotely yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub remote_id: Option<String>,
    pub name: String,
    pub cards: Vec<Card>,
}

impl Deck {
    #[must_use]
    pub fn new(remote_id: Option<String>, name: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            remote_id,
            name: name.into(),
            cards,
        }
    }

    /// Cards by remote id. Cards without an id are skipped.
    #[must_use]
    pub fn by_id(&self) -> HashMap<&str, &Card> {
        index_by_id(&self.cards)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
