//! Semantic duplicate detection.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Card;
use crate::sync::Prompt;

use super::Judge;

/// Default cosine similarity above which two cards are compared.
pub const DEFAULT_THRESHOLD: f32 = 0.85;

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths, empty vectors or a zero vector.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = (norm_a * norm_b).sqrt();
    if magnitude == 0.0 {
        0.0
    } else {
        dot_product / magnitude
    }
}

/// Two cards (by index) and their similarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarPair {
    pub first: usize,
    pub second: usize,
    pub score: f32,
}

/// All index pairs with similarity ≥ `threshold`, most similar first.
#[must_use]
pub fn find_similar_pairs(embeddings: &[Vec<f32>], threshold: f32) -> Vec<SimilarPair> {
    let mut pairs = Vec::new();
    for (i, a) in embeddings.iter().enumerate() {
        for (offset, b) in embeddings[i + 1..].iter().enumerate() {
            let score = cosine_similarity(a, b);
            if score >= threshold {
                pairs.push(SimilarPair {
                    first: i,
                    second: i + 1 + offset,
                    score,
                });
            }
        }
    }
    pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
    pairs
}

/// LLM verdict on a similar pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Same concept; one card is redundant.
    Duplicate,
    /// Related but distinct; keep both.
    Complementary,
    Unclear,
    /// The model could not be asked.
    Error,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Duplicate => "duplicate",
            Self::Complementary => "complementary",
            Self::Unclear => "unclear",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A similar pair with the model's verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedPair {
    #[serde(flatten)]
    pub pair: SimilarPair,
    pub classification: Classification,
    pub reasoning: String,
}

impl ClassifiedPair {
    /// Pairs the user has to look at; complementary ones are skipped.
    #[must_use]
    pub fn needs_review(&self) -> bool {
        self.classification != Classification::Complementary
    }
}

fn classification_prompt(first: &Card, second: &Card) -> String {
    format!(
        r#"Compare these two flashcards and classify their relationship:

Card 1:
Q: {}
A: {}

Card 2:
Q: {}
A: {}

Classify as ONE of:
- "duplicate": Same concept, essentially redundant (one should be removed)
- "complementary": Related but covering different aspects/opposite scenarios (both should be kept)
- "unclear": Cannot determine confidently

Respond with EXACTLY this format:
classification | reasoning (one line explanation)

Example: complementary | Card 1 asks about increasing X, Card 2 about decreasing X - opposite scenarios of same concept"#,
        first.question, first.answer, second.question, second.answer
    )
}

/// Parse a `classification | reasoning` reply.
///
/// Anything that does not follow the format is `Unclear`, with the reason
/// saying why.
#[must_use]
pub fn parse_classification(reply: &str) -> (Classification, String) {
    let Some((label, reasoning)) = reply.trim().split_once('|') else {
        let preview: String = reply.trim().chars().take(50).collect();
        return (
            Classification::Unclear,
            format!("Response format invalid: {preview}"),
        );
    };

    let label = label.trim().trim_matches('"').to_lowercase();
    let reasoning = reasoning.trim().to_string();
    match label.as_str() {
        "duplicate" => (Classification::Duplicate, reasoning),
        "complementary" => (Classification::Complementary, reasoning),
        "unclear" => (Classification::Unclear, reasoning),
        other => (
            Classification::Unclear,
            format!("Invalid classification '{other}': {reasoning}"),
        ),
    }
}

/// Ask the judge about one pair. A failed request becomes
/// [`Classification::Error`] rather than aborting the run.
pub async fn classify_pair<J: Judge>(judge: &J, cards: &[Card], pair: SimilarPair) -> ClassifiedPair {
    let prompt = classification_prompt(&cards[pair.first], &cards[pair.second]);
    let (classification, reasoning) = match judge.complete(&prompt).await {
        Ok(reply) => parse_classification(&reply),
        Err(e) => {
            warn!(first = pair.first, second = pair.second, error = %e, "Classification failed");
            let message: String = e.to_string().chars().take(100).collect();
            (Classification::Error, format!("Request failed: {message}"))
        }
    };
    debug!(first = pair.first, second = pair.second, %classification, "Classified pair");
    ClassifiedPair {
        pair,
        classification,
        reasoning,
    }
}

/// What to do with one reviewed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairChoice {
    KeepFirst,
    KeepSecond,
    KeepBoth,
    Skip,
    Quit,
}

impl PairChoice {
    pub const ALL: [Self; 5] = [
        Self::KeepFirst,
        Self::KeepSecond,
        Self::KeepBoth,
        Self::Skip,
        Self::Quit,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::KeepFirst => "Keep card 1, remove card 2",
            Self::KeepSecond => "Keep card 2, remove card 1",
            Self::KeepBoth => "Keep both (not duplicates)",
            Self::Skip => "Skip to next pair",
            Self::Quit => "Quit without saving",
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn describe_pair(cards: &[Card], reviewed: &ClassifiedPair, number: usize, total: usize) -> String {
    let first = &cards[reviewed.pair.first];
    let second = &cards[reviewed.pair.second];
    let show = |card: &Card| {
        let mut text = format!(
            "    Q: {}\n    A: {}",
            truncate(&card.question, 100),
            truncate(&card.answer, 100)
        );
        if let Some(id) = &card.remote_id {
            text.push_str(&format!("\n    ID: {id}"));
        }
        text
    };
    format!(
        "Pair {number}/{total} - similarity {:.3}\nClassification: {} ({})\n\n[1] Card 1:\n{}\n\n[2] Card 2:\n{}",
        reviewed.pair.score,
        reviewed.classification.to_string().to_uppercase(),
        reviewed.reasoning,
        show(first),
        show(second),
    )
}

/// Walk the user through the pairs that need review.
///
/// Returns the indices to remove, or `None` if the user quit. Pairs touching
/// a card already marked for removal are passed over.
///
/// # Errors
///
/// Returns an error if the prompt cannot read an answer.
pub fn resolve_pairs<P: Prompt>(
    prompt: &mut P,
    cards: &[Card],
    pairs: &[ClassifiedPair],
) -> Result<Option<BTreeSet<usize>>> {
    let review: Vec<&ClassifiedPair> = pairs.iter().filter(|p| p.needs_review()).collect();
    let labels: Vec<&str> = PairChoice::ALL.iter().map(|c| c.label()).collect();
    let skip = PairChoice::ALL
        .iter()
        .position(|c| *c == PairChoice::Skip)
        .unwrap_or_default();

    let mut remove = BTreeSet::new();
    for (idx, reviewed) in review.iter().enumerate() {
        let SimilarPair { first, second, .. } = reviewed.pair;
        if remove.contains(&first) || remove.contains(&second) {
            continue;
        }

        let message = describe_pair(cards, reviewed, idx + 1, review.len());
        let choice = prompt.select(&message, &labels, skip)?;
        match PairChoice::ALL.get(choice).copied().unwrap_or(PairChoice::Skip) {
            PairChoice::KeepFirst => {
                remove.insert(second);
            }
            PairChoice::KeepSecond => {
                remove.insert(first);
            }
            PairChoice::KeepBoth | PairChoice::Skip => {}
            PairChoice::Quit => return Ok(None),
        }
    }
    Ok(Some(remove))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::fakes::ScriptedJudge;
    use crate::error::Error;
    use crate::sync::AutoPrompt;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_find_similar_pairs_sorted_desc() {
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.14],
            vec![0.0, 1.0],
            vec![1.0, 0.01],
        ];
        let pairs = find_similar_pairs(&embeddings, 0.85);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].first, pairs[0].second), (0, 3));
        assert!(pairs.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(pairs.iter().all(|p| p.first != 2 && p.second != 2));
    }

    #[test]
    fn test_parse_classification() {
        assert_eq!(
            parse_classification("duplicate | same fact"),
            (Classification::Duplicate, "same fact".to_string())
        );
        assert_eq!(
            parse_classification("Complementary|opposite cases").0,
            Classification::Complementary
        );
        assert_eq!(parse_classification("no pipe here").0, Classification::Unclear);
        let (class, reason) = parse_classification("maybe | hmm");
        assert_eq!(class, Classification::Unclear);
        assert!(reason.contains("maybe"));
    }

    #[tokio::test]
    async fn test_classify_pair_maps_failure_to_error() {
        let cards = vec![Card::new("Q1", "A1"), Card::new("Q2", "A2")];
        let judge = ScriptedJudge::new(vec![
            Ok("duplicate | same".into()),
            Err(Error::Curation("rate limited".into())),
        ]);
        let pair = SimilarPair {
            first: 0,
            second: 1,
            score: 0.9,
        };

        let ok = classify_pair(&judge, &cards, pair).await;
        assert_eq!(ok.classification, Classification::Duplicate);

        let failed = classify_pair(&judge, &cards, pair).await;
        assert_eq!(failed.classification, Classification::Error);
        assert!(failed.reasoning.contains("rate limited"));
    }

    /// Answers `select` from a fixed script.
    struct Choices(Vec<PairChoice>);

    impl Prompt for Choices {
        fn confirm(&mut self, _message: &str) -> Result<bool> {
            Ok(true)
        }

        fn select(&mut self, _message: &str, _options: &[&str], _default: usize) -> Result<usize> {
            let next = self.0.remove(0);
            Ok(PairChoice::ALL.iter().position(|c| *c == next).unwrap())
        }
    }

    fn classified(first: usize, second: usize, classification: Classification) -> ClassifiedPair {
        ClassifiedPair {
            pair: SimilarPair {
                first,
                second,
                score: 0.9,
            },
            classification,
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_resolve_pairs_skips_complementary_and_removed() {
        let cards: Vec<Card> = (0..4).map(|i| Card::new(format!("Q{i}"), "A")).collect();
        let pairs = vec![
            classified(0, 1, Classification::Duplicate),
            classified(1, 2, Classification::Complementary),
            classified(0, 3, Classification::Unclear),
            classified(1, 3, Classification::Duplicate),
        ];
        // Pair (0,1) removes 1, so (1,3) is never asked about.
        let mut prompt = Choices(vec![PairChoice::KeepFirst, PairChoice::KeepSecond]);

        let removed = resolve_pairs(&mut prompt, &cards, &pairs).unwrap().unwrap();
        assert_eq!(removed, BTreeSet::from([0, 1]));
        assert!(prompt.0.is_empty());
    }

    #[test]
    fn test_resolve_pairs_quit() {
        let cards = vec![Card::new("Q0", "A"), Card::new("Q1", "A")];
        let pairs = vec![classified(0, 1, Classification::Duplicate)];
        let mut prompt = Choices(vec![PairChoice::Quit]);
        assert!(resolve_pairs(&mut prompt, &cards, &pairs).unwrap().is_none());
    }

    #[test]
    fn test_auto_prompt_skips_everything() {
        let cards = vec![Card::new("Q0", "A"), Card::new("Q1", "A")];
        let pairs = vec![classified(0, 1, Classification::Duplicate)];
        let removed = resolve_pairs(&mut AutoPrompt::yes(), &cards, &pairs).unwrap().unwrap();
        assert!(removed.is_empty());
    }
}
