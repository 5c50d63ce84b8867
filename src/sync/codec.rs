//! Deck file codec.
//!
//! A deck file is UTF-8 markdown made of repeating blocks. Each block is a
//! small frontmatter section followed by a question and an answer, with every
//! section introduced by a line containing only the delimiter:
//!
//! ```text
//! ---
//! card_id: AbCdEfGh
//! tags: ["rust", "ownership"]
//! archived: true
//! ---
//! What does the borrow checker enforce?
//! ---
//! Aliasing XOR mutability.
//! ```
//!
//! Frontmatter is a strict schema: `card_id` (id or `null`), `tags` (JSON
//! array of strings, omitted when empty) and `archived` (omitted when false).
//! Anything else is a [`FormatError`].
//!
//! Remote records use a simpler wire format with no frontmatter: question,
//! delimiter line, answer.

use std::collections::BTreeSet;

use crate::model::Card;

/// Section delimiter token.
pub const DELIMITER: &str = "---";

/// Errors raised while parsing or validating a deck file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Text before the first delimiter line.
    #[error("line {line}: unexpected text before the first card block")]
    UnexpectedPreamble { line: usize },

    /// A frontmatter line that is not `key: value`.
    #[error("line {line}: expected `key: value` in frontmatter, got `{text}`")]
    MalformedLine { line: usize, text: String },

    /// A frontmatter key outside the schema.
    #[error("line {line}: unknown frontmatter key `{key}` (expected card_id, tags or archived)")]
    UnknownKey { line: usize, key: String },

    /// The same frontmatter key twice in one block.
    #[error("line {line}: duplicate frontmatter key `{key}`")]
    DuplicateKey { line: usize, key: String },

    /// `tags` is not a JSON array of strings.
    #[error("line {line}: tags must be a JSON array of strings: {message}")]
    InvalidTags { line: usize, message: String },

    /// `archived` is not a boolean.
    #[error("line {line}: archived must be true or false, got `{value}`")]
    InvalidArchived { line: usize, value: String },

    /// A block without both a question and an answer section.
    #[error("card {card} (line {line}): expected frontmatter, question and answer sections")]
    IncompleteCard { card: usize, line: usize },

    /// Card text that would be read back as a section boundary.
    #[error("card `{preview}`: question or answer contains a line with only `---`")]
    DelimiterInContent { preview: String },

    /// The file has no content at all.
    #[error("file is empty")]
    EmptyFile,

    /// The file parsed but holds no card blocks.
    #[error("no cards found")]
    NoCards,

    /// A card with a blank question or answer.
    #[error("card {card}: {field} is empty")]
    EmptyField { card: usize, field: &'static str },

    /// Two cards in one file claim the same remote id.
    #[error("cards {first} and {second} share card_id {id}")]
    DuplicateId { id: String, first: usize, second: usize },
}

/// One delimiter-separated section and the 1-based line it starts on.
struct Section<'a> {
    line: usize,
    lines: Vec<&'a str>,
}

impl Section<'_> {
    fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }

    fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim() == DELIMITER
}

fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = vec![Section { line: 1, lines: Vec::new() }];
    for (idx, line) in text.lines().enumerate() {
        if is_delimiter(line) {
            sections.push(Section {
                line: idx + 2,
                lines: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line);
        }
    }
    sections
}

/// Parse a deck file into its ordered cards.
///
/// # Errors
///
/// Returns a [`FormatError`] if a frontmatter block is malformed or a card
/// block lacks its question or answer section.
pub fn parse(text: &str) -> Result<Vec<Card>, FormatError> {
    let mut sections = split_sections(text).into_iter();

    let preamble = sections.next();
    if let Some(preamble) = preamble.filter(|p| !p.is_blank()) {
        let offset = preamble
            .lines
            .iter()
            .position(|l| !l.trim().is_empty())
            .unwrap_or_default();
        return Err(FormatError::UnexpectedPreamble {
            line: preamble.line + offset,
        });
    }

    let rest: Vec<Section<'_>> = sections.collect();
    let mut cards = Vec::with_capacity(rest.len() / 3);
    let mut chunks = rest.chunks(3).peekable();

    while let Some(chunk) = chunks.next() {
        let card_no = cards.len() + 1;
        match chunk {
            [frontmatter, question, answer] => {
                let mut card = parse_frontmatter(frontmatter)?;
                card.question = question.text();
                card.answer = answer.text();
                cards.push(card);
            }
            // A trailing delimiter with nothing after it.
            [only] if chunks.peek().is_none() && only.is_blank() => {}
            [first, ..] => {
                return Err(FormatError::IncompleteCard {
                    card: card_no,
                    line: first.line.saturating_sub(1),
                });
            }
            [] => {}
        }
    }

    Ok(cards)
}

fn parse_frontmatter(section: &Section<'_>) -> Result<Card, FormatError> {
    let mut card = Card::new("", "");
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for (offset, raw) in section.lines.iter().enumerate() {
        let line = section.line + offset;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (key, value) = trimmed
            .split_once(':')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| FormatError::MalformedLine {
                line,
                text: trimmed.to_string(),
            })?;

        match key {
            "card_id" | "tags" | "archived" => {
                if !seen.insert(key) {
                    return Err(FormatError::DuplicateKey {
                        line,
                        key: key.to_string(),
                    });
                }
            }
            _ => {
                return Err(FormatError::UnknownKey {
                    line,
                    key: key.to_string(),
                });
            }
        }

        match key {
            "card_id" => card.remote_id = parse_card_id(value),
            "tags" => card.tags = parse_tags(value, line)?,
            _ => {
                card.archived = match value {
                    "true" => true,
                    "false" => false,
                    other => {
                        return Err(FormatError::InvalidArchived {
                            line,
                            value: other.to_string(),
                        });
                    }
                };
            }
        }
    }

    Ok(card)
}

fn parse_card_id(value: &str) -> Option<String> {
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .trim();
    match unquoted.to_ascii_lowercase().as_str() {
        "" | "null" | "none" | "~" => None,
        _ => Some(unquoted.to_string()),
    }
}

fn parse_tags(value: &str, line: usize) -> Result<BTreeSet<String>, FormatError> {
    if value.is_empty() {
        return Ok(BTreeSet::new());
    }
    serde_json::from_str::<Vec<String>>(value)
        .map(|tags| tags.into_iter().collect())
        .map_err(|e| FormatError::InvalidTags {
            line,
            message: e.to_string(),
        })
}

/// Serialize cards into the deck file format.
///
/// The output is canonical: empty tags and a false `archived` flag are
/// omitted, and field order is fixed.
#[must_use]
pub fn serialize(cards: &[Card]) -> String {
    let mut out = String::new();
    for card in cards {
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str("card_id: ");
        out.push_str(card.remote_id.as_deref().unwrap_or("null"));
        out.push('\n');
        if !card.tags.is_empty() {
            let tags: Vec<String> = card
                .tags
                .iter()
                .map(|t| serde_json::Value::String(t.clone()).to_string())
                .collect();
            out.push_str(&format!("tags: [{}]\n", tags.join(", ")));
        }
        if card.archived {
            out.push_str("archived: true\n");
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(card.question.trim());
        out.push('\n');
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(card.answer.trim());
        out.push('\n');
    }
    out
}

/// Check that every card can be written without corrupting the file.
///
/// # Errors
///
/// Returns [`FormatError::DelimiterInContent`] for the first card whose
/// question or answer contains a standalone delimiter line.
pub fn ensure_serializable(cards: &[Card]) -> Result<(), FormatError> {
    match cards.iter().find(|c| !is_representable(c)) {
        Some(card) => Err(FormatError::DelimiterInContent {
            preview: card.preview(40),
        }),
        None => Ok(()),
    }
}

/// True when the card survives a write and re-read of a deck file.
///
/// Multi-side remote cards carry more than one delimiter line and do not.
#[must_use]
pub fn is_representable(card: &Card) -> bool {
    !card.question.lines().chain(card.answer.lines()).any(is_delimiter)
}

/// Build the remote `content` field from a question and answer.
#[must_use]
pub fn join_wire_content(question: &str, answer: &str) -> String {
    format!("{}\n{DELIMITER}\n{}", question.trim(), answer.trim())
}

/// Split a remote `content` field into question and answer.
///
/// Splits at the first delimiter line. Cards authored in the web UI may use
/// an inline `---` instead, so the first occurrence is the fallback; content
/// without any delimiter is all question.
#[must_use]
pub fn split_wire_content(content: &str) -> (String, String) {
    let mut question = Vec::new();
    let mut lines = content.lines();
    for line in lines.by_ref() {
        if is_delimiter(line) {
            let answer: Vec<&str> = lines.collect();
            return (
                question.join("\n").trim().to_string(),
                answer.join("\n").trim().to_string(),
            );
        }
        question.push(line);
    }

    match content.split_once(DELIMITER) {
        Some((q, a)) => (q.trim().to_string(), a.trim().to_string()),
        None => (content.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ncard_id: AbCdEfGh\ntags: [\"python\", \"basics\"]\n---\nWhat is a list?\n---\nAn ordered, mutable sequence.\n---\ncard_id: null\narchived: true\n---\nWhat is a tuple?\n---\nAn immutable sequence.\n";

    #[test]
    fn test_parse_sample() {
        let cards = parse(SAMPLE).unwrap();
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].remote_id.as_deref(), Some("AbCdEfGh"));
        assert_eq!(cards[0].question, "What is a list?");
        assert_eq!(cards[0].answer, "An ordered, mutable sequence.");
        assert!(cards[0].tags.contains("python"));
        assert!(cards[0].tags.contains("basics"));
        assert!(!cards[0].archived);

        assert_eq!(cards[1].remote_id, None);
        assert!(cards[1].archived);
        assert!(cards[1].tags.is_empty());
    }

    #[test]
    fn test_serialize_sample_is_canonical() {
        let cards = parse(SAMPLE).unwrap();
        let text = serialize(&cards);
        // Tags come back sorted; everything else is byte-identical.
        assert_eq!(text, SAMPLE.replace("[\"python\", \"basics\"]", "[\"basics\", \"python\"]"));
    }

    #[test]
    fn test_round_trip_law() {
        let cards = vec![
            Card::new("Multi\nline question", "Answer with  inner  spaces").with_id("AbCdEfGh"),
            Card::new("Q2", "A2").with_tags(["z", "a \"quoted\" tag"]),
            Card::new("Q3", "A3").archived(true).with_id("ZyXwVuTs"),
            Card::new("Q4", "# Heading\n\n- bullet"),
        ];
        let parsed = parse(&serialize(&cards)).unwrap();
        assert_eq!(parsed, cards);
    }

    #[test]
    fn test_round_trip_canonicalizes() {
        let raw = Card::new("  padded question \n", "\n padded answer");
        let parsed = parse(&serialize(&[raw.clone()])).unwrap();
        assert_eq!(parsed, vec![raw.canonical()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n  \n").unwrap().is_empty());
        assert_eq!(serialize(&[]), "");
    }

    #[test]
    fn test_trailing_delimiter_tolerated() {
        let text = "---\ncard_id: null\n---\nQ\n---\nA\n---\n";
        assert_eq!(parse(text).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_answer_is_error() {
        let text = "---\ncard_id: null\n---\nQ only\n";
        assert!(matches!(
            parse(text),
            Err(FormatError::IncompleteCard { card: 1, .. })
        ));
    }

    #[test]
    fn test_second_card_incomplete() {
        let text = "---\ncard_id: null\n---\nQ\n---\nA\n---\ncard_id: null\n---\nQ2\n";
        assert!(matches!(
            parse(text),
            Err(FormatError::IncompleteCard { card: 2, line: 7 })
        ));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let text = "---\ncard_id: null\ndeck: x\n---\nQ\n---\nA\n";
        assert_eq!(
            parse(text),
            Err(FormatError::UnknownKey {
                line: 3,
                key: "deck".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let text = "---\ncard_id: a\ncard_id: b\n---\nQ\n---\nA\n";
        assert!(matches!(parse(text), Err(FormatError::DuplicateKey { line: 3, .. })));
    }

    #[test]
    fn test_bad_tags_is_error() {
        let text = "---\ncard_id: null\ntags: python, basics\n---\nQ\n---\nA\n";
        assert!(matches!(parse(text), Err(FormatError::InvalidTags { line: 3, .. })));

        let text = "---\ncard_id: null\ntags: [1, 2]\n---\nQ\n---\nA\n";
        assert!(matches!(parse(text), Err(FormatError::InvalidTags { .. })));
    }

    #[test]
    fn test_bad_archived_is_error() {
        let text = "---\ncard_id: null\narchived: yes\n---\nQ\n---\nA\n";
        assert_eq!(
            parse(text),
            Err(FormatError::InvalidArchived {
                line: 3,
                value: "yes".to_string()
            })
        );
    }

    #[test]
    fn test_malformed_frontmatter_line() {
        let text = "---\njust some words\n---\nQ\n---\nA\n";
        assert!(matches!(parse(text), Err(FormatError::MalformedLine { line: 2, .. })));
    }

    #[test]
    fn test_preamble_is_error() {
        let text = "# My deck\n---\ncard_id: null\n---\nQ\n---\nA\n";
        assert_eq!(parse(text), Err(FormatError::UnexpectedPreamble { line: 1 }));
    }

    #[test]
    fn test_card_id_spellings() {
        assert_eq!(parse_card_id("null"), None);
        assert_eq!(parse_card_id("None"), None);
        assert_eq!(parse_card_id(""), None);
        assert_eq!(parse_card_id("\"AbCdEfGh\""), Some("AbCdEfGh".to_string()));
        assert_eq!(parse_card_id("AbCdEfGh"), Some("AbCdEfGh".to_string()));
    }

    #[test]
    fn test_ensure_serializable() {
        assert!(ensure_serializable(&[Card::new("Q", "inline --- is fine")]).is_ok());
        assert!(!is_representable(&Card::new("Front", "Side two\n---\nSide three")));
        assert!(matches!(
            ensure_serializable(&[Card::new("Q", "part one\n---\npart two")]),
            Err(FormatError::DelimiterInContent { .. })
        ));
    }

    #[test]
    fn test_wire_content() {
        assert_eq!(join_wire_content(" Q ", "A\n"), "Q\n---\nA");
        assert_eq!(
            split_wire_content("What is X?\n---\nX is Y"),
            ("What is X?".to_string(), "X is Y".to_string())
        );
        assert_eq!(
            split_wire_content("Inline Q --- inline A"),
            ("Inline Q".to_string(), "inline A".to_string())
        );
        assert_eq!(
            split_wire_content("No separator"),
            ("No separator".to_string(), String::new())
        );
        assert_eq!(
            split_wire_content("Q\n---\nA\n---\nmore"),
            ("Q".to_string(), "A\n---\nmore".to_string())
        );
    }
}
