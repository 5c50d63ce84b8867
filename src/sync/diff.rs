//! Identity-based card diffing.
//!
//! Identity is the remote id. A candidate card without an id has never been
//! synced, so it is always `added`; ids only the baseline knows are
//! `deleted`. Position in either slice is irrelevant.

use std::collections::HashSet;

use crate::model::{index_by_id, Card};

/// Classification of every card in a baseline/candidate pair.
///
/// `added`, `modified` and `unchanged` hold candidate cards; `deleted` holds
/// baseline cards. Each list keeps the order of the slice it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDiff {
    pub added: Vec<Card>,
    pub modified: Vec<Card>,
    pub deleted: Vec<Card>,
    pub unchanged: Vec<Card>,
}

impl CardDiff {
    /// Ids of modified cards.
    #[must_use]
    pub fn modified_ids(&self) -> HashSet<&str> {
        self.modified
            .iter()
            .filter_map(|c| c.remote_id.as_deref())
            .collect()
    }
}

/// Diff a candidate card collection against a baseline.
///
/// A candidate carrying an id the baseline has never seen is reported as
/// `unchanged`: the diff alone cannot tell what it changed from. Callers that
/// care about such untracked ids check them against another source.
#[must_use]
pub fn diff(baseline: &[Card], candidate: &[Card]) -> CardDiff {
    let base_by_id = index_by_id(baseline);
    let mut result = CardDiff::default();

    for card in candidate {
        match card.remote_id.as_deref() {
            None => result.added.push(card.clone()),
            Some(id) => match base_by_id.get(id) {
                Some(base) if !base.same_content(card) => result.modified.push(card.clone()),
                _ => result.unchanged.push(card.clone()),
            },
        }
    }

    let candidate_ids: HashSet<&str> = candidate
        .iter()
        .filter_map(|c| c.remote_id.as_deref())
        .collect();
    result.deleted = baseline
        .iter()
        .filter(|c| {
            c.remote_id
                .as_deref()
                .is_some_and(|id| !candidate_ids.contains(id))
        })
        .cloned()
        .collect();

    result
}
