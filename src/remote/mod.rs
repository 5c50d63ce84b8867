//! Remote flashcard service boundary.
//!
//! The merge engine only talks to [`RemoteGateway`]; [`MochiClient`] is the
//! HTTP implementation. Tests substitute an in-memory gateway.

mod mochi;

pub use mochi::{paginate, MochiClient, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGE_RETRIES};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Card;
use crate::sync::codec::join_wire_content;

/// A deck as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDeck {
    pub id: String,
    pub name: String,
}

/// Result of listing a deck's cards.
///
/// `truncated` is set when pagination stopped early on the service's known
/// server-error defect; `cards` then holds only what was fetched before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardListing {
    pub cards: Vec<Card>,
    pub truncated: bool,
}

impl CardListing {
    #[must_use]
    pub fn complete(cards: Vec<Card>) -> Self {
        Self {
            cards,
            truncated: false,
        }
    }
}

/// Fields written on card create and update.
///
/// Updates are partial on the service side, so every field is always sent:
/// an omitted key would leave the old tags or archive flag in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPayload {
    pub content: String,
    pub tags: Vec<String>,
    #[serde(rename = "archived?")]
    pub archived: bool,
}

impl From<&Card> for CardPayload {
    fn from(card: &Card) -> Self {
        Self {
            content: join_wire_content(&card.question, &card.answer),
            tags: card.tags.iter().cloned().collect(),
            archived: card.archived,
        }
    }
}

/// Operations the merge engine needs from the remote service.
///
/// Calls are awaited one at a time; implementations never need to handle
/// overlapping requests.
pub trait RemoteGateway: Send + Sync {
    /// List all decks.
    fn list_decks(&self) -> impl std::future::Future<Output = Result<Vec<RemoteDeck>>> + Send;

    /// Fetch one deck.
    fn get_deck(&self, deck_id: &str) -> impl std::future::Future<Output = Result<RemoteDeck>> + Send;

    /// Fetch every card of a deck, page by page.
    fn list_cards(
        &self,
        deck_id: &str,
        page_size: usize,
    ) -> impl std::future::Future<Output = Result<CardListing>> + Send;

    /// Create a card and return its new id.
    fn create_card(
        &self,
        deck_id: &str,
        payload: &CardPayload,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Overwrite an existing card's fields.
    fn update_card(
        &self,
        card_id: &str,
        payload: &CardPayload,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a card.
    fn delete_card(&self, card_id: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Create a deck and return its new id.
    fn create_deck(&self, name: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}
