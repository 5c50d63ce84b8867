//! LLM quality grading for `curate`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Card;

use super::Judge;

/// Default grade below which a card is proposed for archiving.
pub const DEFAULT_MIN_SCORE: u8 = 6;

/// Highest grade.
pub const MAX_SCORE: u8 = 10;

/// A parsed `score | reasoning` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub score: u8,
    pub reasoning: String,
}

/// A card's index and its grade, if grading succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradedCard {
    pub index: usize,
    pub grade: Option<Grade>,
}

fn grading_prompt(card: &Card) -> String {
    format!(
        r"Grade this flashcard for spaced-repetition study on a scale from 0 to 10.

Q: {}
A: {}

A good card asks one clear question, has a single unambiguous answer, and is
worth remembering. Penalize vague questions, answers that list many facts,
trivia, and cards that cannot be answered without extra context.

Respond with EXACTLY this format:
score | reasoning (one line explanation)

Example: 4 | Answer lists five unrelated facts; split into separate cards",
        card.question, card.answer
    )
}

/// Parse a `score | reasoning` reply.
///
/// # Errors
///
/// Returns [`Error::Curation`] if the reply has no `|`, or the score is not
/// an integer from 0 to 10.
pub fn parse_grade(reply: &str) -> Result<Grade> {
    let (score, reasoning) = reply
        .trim()
        .split_once('|')
        .ok_or_else(|| Error::Curation(format!("Grade reply format invalid: {}", reply.trim())))?;

    let score: u8 = score
        .trim()
        .parse()
        .map_err(|_| Error::Curation(format!("Grade is not a number: {}", score.trim())))?;
    if score > MAX_SCORE {
        return Err(Error::Curation(format!("Grade {score} is outside 0-{MAX_SCORE}")));
    }

    Ok(Grade {
        score,
        reasoning: reasoning.trim().to_string(),
    })
}

/// Grade one card.
///
/// # Errors
///
/// Returns the judge's error or a parse error.
pub async fn grade_card<J: Judge>(judge: &J, card: &Card) -> Result<Grade> {
    let reply = judge.complete(&grading_prompt(card)).await?;
    parse_grade(&reply)
}

/// Grade every card that is not archived, one request at a time.
///
/// Cards the judge fails on are returned ungraded and never proposed for
/// archiving.
pub async fn grade_cards<J: Judge>(judge: &J, cards: &[Card]) -> Vec<GradedCard> {
    let mut graded = Vec::with_capacity(cards.len());
    for (index, card) in cards.iter().enumerate() {
        if card.archived {
            continue;
        }
        let grade = match grade_card(judge, card).await {
            Ok(grade) => {
                debug!(index, score = grade.score, "Graded card");
                Some(grade)
            }
            Err(e) => {
                warn!(index, error = %e, "Could not grade card");
                None
            }
        };
        graded.push(GradedCard { index, grade });
    }
    graded
}

/// Graded cards scoring strictly below `min_score`, lowest first.
#[must_use]
pub fn select_below(graded: &[GradedCard], min_score: u8) -> Vec<&GradedCard> {
    let mut weak: Vec<&GradedCard> = graded
        .iter()
        .filter(|g| g.grade.as_ref().is_some_and(|grade| grade.score < min_score))
        .collect();
    weak.sort_by_key(|g| (g.grade.as_ref().map(|grade| grade.score), g.index));
    weak
}
