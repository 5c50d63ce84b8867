//! AI-assisted deck curation.
//!
//! Two commands share one OpenRouter account:
//!
//! - **dedupe**: embed every card, pair cards whose cosine similarity clears
//!   a threshold, and let an LLM label each pair before the user decides
//! - **curate**: have an LLM grade each card 0-10 and archive the weak ones
//!
//! Scoring backends sit behind [`Embedder`] and [`Judge`] so the selection
//! logic is testable without network access.

pub mod dedupe;
pub mod grade;
mod openrouter;

pub use dedupe::{
    classify_pair, cosine_similarity, find_similar_pairs, parse_classification, resolve_pairs,
    Classification, ClassifiedPair, PairChoice, SimilarPair,
};
pub use grade::{grade_card, grade_cards, parse_grade, select_below, Grade, GradedCard};
pub use openrouter::{OpenRouterClient, CHAT_MODEL, EMBEDDING_MODEL, OPENROUTER_BASE_URL};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Card;

/// Texts sent per embeddings request.
pub const EMBEDDING_BATCH_SIZE: usize = 100;

/// Turns texts into embedding vectors.
pub trait Embedder: Send + Sync {
    /// Embed one batch; the result has one vector per input, in order.
    fn embed_batch(&self, texts: &[String]) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Answers a single free-text prompt.
pub trait Judge: Send + Sync {
    fn complete(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Text embedded for a card: question and answer on separate lines.
#[must_use]
pub fn embedding_text(card: &Card) -> String {
    format!("{}\n{}", card.question, card.answer)
}

/// Embed every card, [`EMBEDDING_BATCH_SIZE`] at a time.
///
/// # Errors
///
/// Returns the embedder's error, or [`Error::Curation`] if a batch comes
/// back with the wrong number of vectors.
pub async fn embed_cards<E: Embedder>(embedder: &E, cards: &[Card]) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = cards.iter().map(embedding_text).collect();
    let mut embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(Error::Curation(format!(
                "Embedding batch returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        embeddings.extend(vectors);
        debug!(done = embeddings.len(), total = texts.len(), "Embedded batch");
    }

    Ok(embeddings)
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Embeds each text as a fixed vector keyed by its first line.
    pub struct FakeEmbedder {
        pub vectors: Vec<(String, Vec<f32>)>,
        pub calls: Mutex<Vec<usize>>,
    }

    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| {
                    let first = t.lines().next().unwrap_or_default();
                    self.vectors
                        .iter()
                        .find(|(k, _)| k == first)
                        .map_or_else(|| vec![0.0, 0.0, 1.0], |(_, v)| v.clone())
                })
                .collect())
        }
    }

    /// Replays scripted answers in order.
    pub struct ScriptedJudge {
        pub answers: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedJudge {
        pub fn new(answers: Vec<Result<String>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
            }
        }
    }

    impl Judge for ScriptedJudge {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Curation("no scripted answer".into())))
        }
    }
}
