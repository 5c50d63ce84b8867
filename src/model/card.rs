//! Flashcard record.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::sync::fingerprint;

/// One question/answer flashcard.
///
/// `remote_id` is `None` for a card that exists only in the local file and
/// must be created on the next push. Tags are a set: order is not
/// significant, and `BTreeSet` keeps their serialized order stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "card_id")]
    pub remote_id: Option<String>,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archived: bool,
}

impl Card {
    /// Create a never-synced card.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            remote_id: None,
            question: question.into(),
            answer: answer.into(),
            tags: BTreeSet::new(),
            archived: false,
        }
    }

    /// Builder-style remote id assignment.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.remote_id = Some(id.into());
        self
    }

    /// Builder-style tag assignment.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style archived flag.
    #[must_use]
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    /// Content-derived hash of question and answer.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.question, &self.answer)
    }

    /// Whether two cards carry the same semantic content.
    ///
    /// Compares fingerprint, tags and archived flag; the remote id is not
    /// part of content.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.tags == other.tags
            && self.archived == other.archived
            && self.fingerprint() == other.fingerprint()
    }

    /// Canonical form: question and answer trimmed, empty id treated as none.
    #[must_use]
    pub fn canonical(&self) -> Self {
        Self {
            remote_id: self.remote_id.clone().filter(|id| !id.trim().is_empty()),
            question: self.question.trim().to_string(),
            answer: self.answer.trim().to_string(),
            tags: self.tags.clone(),
            archived: self.archived,
        }
    }

    /// Short single-line preview of the question for terminal output.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.question.lines().next().unwrap_or_default();
        if first_line.chars().count() > max_chars {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{cut}...")
        } else {
            first_line.to_string()
        }
    }
}

/// Index a card slice by remote id. Cards without an id are skipped.
#[must_use]
pub fn index_by_id(cards: &[Card]) -> HashMap<&str, &Card> {
    cards
        .iter()
        .filter_map(|c| c.remote_id.as_deref().map(|id| (id, c)))
        .collect()
}
