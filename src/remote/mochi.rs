//! Mochi REST API client.
//!
//! Authenticates with HTTP basic auth (API key as user, empty password).
//! Card listing is bookmark-paginated; the service is known to answer with a
//! server error after many pages, which ends pagination with a partial,
//! flagged result instead of failing the whole call.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Card;
use crate::sync::codec::split_wire_content;

use super::{CardListing, CardPayload, RemoteDeck, RemoteGateway};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://app.mochi.cards/api";

/// Cards requested per page (the API maximum).
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Extra attempts for a page that fails with a server error.
pub const MAX_PAGE_RETRIES: u32 = 2;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mochi HTTP client.
pub struct MochiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MochiClient {
    /// Build a client from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .mochi_api_key
            .clone()
            .ok_or_else(|| Error::Config("Mochi API key not configured".to_string()))?;
        Self::with_base_url(config.mochi_base_url.clone(), api_key)
    }

    /// Build a client against an explicit API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .basic_auth(&self.api_key, Some(""))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .basic_auth(&self.api_key, Some(""))
    }

    async fn fetch_card_page(
        &self,
        deck_id: &str,
        page_size: usize,
        bookmark: Option<String>,
    ) -> Result<Page<RawCard>> {
        let mut request = self
            .get("cards/")
            .query(&[("deck-id", deck_id), ("limit", &page_size.to_string())]);
        if let Some(bookmark) = &bookmark {
            request = request.query(&[("bookmark", bookmark)]);
        }
        let response = check("list cards", request.send().await?).await?;
        Ok(response.json().await?)
    }
}

/// Fail on a non-success status, keeping the response body for the message.
async fn check(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::RemoteStatus {
        operation: operation.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// One page of a bookmark-paginated listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub docs: Vec<T>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// Card record as returned by the API.
#[derive(Debug, Deserialize)]
struct RawCard {
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default, rename = "archived?", alias = "archived")]
    archived: Option<bool>,
}

impl From<RawCard> for Card {
    fn from(raw: RawCard) -> Self {
        let (question, answer) = split_wire_content(&raw.content);
        Card::new(question, answer)
            .with_id(raw.id)
            .with_tags(raw.tags.unwrap_or_default())
            .archived(raw.archived.unwrap_or(false))
    }
}

#[derive(Debug, Deserialize)]
struct DeckList {
    docs: Vec<RemoteDeck>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateCardRequest<'a> {
    #[serde(rename = "deck-id")]
    deck_id: &'a str,
    #[serde(flatten)]
    payload: &'a CardPayload,
}

#[derive(Debug, Serialize)]
struct CreateDeckRequest<'a> {
    name: &'a str,
}

/// Drive a bookmark-paginated listing to the end.
///
/// `fetch` is called with `None` first, then with each returned bookmark.
/// The listing ends on an empty page, a missing bookmark, or a bookmark seen
/// before. A server error (HTTP 5xx) after at least one page is retried
/// [`MAX_PAGE_RETRIES`] times, then pagination stops and the result is
/// flagged truncated. Every other error propagates.
///
/// # Errors
///
/// Returns the first error that is not the tolerated server error.
pub async fn paginate<T, F, Fut>(mut fetch: F) -> Result<(Vec<T>, bool)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut bookmark: Option<String> = None;
    let mut seen_bookmarks = HashSet::new();
    let mut pages = 0usize;

    loop {
        let mut attempt = 0u32;
        let page = loop {
            match fetch(bookmark.clone()).await {
                Ok(page) => break page,
                Err(Error::RemoteStatus { status, body, .. }) if status >= 500 && pages > 0 => {
                    attempt += 1;
                    if attempt > MAX_PAGE_RETRIES {
                        warn!(
                            pages,
                            fetched = items.len(),
                            status,
                            "Server error during pagination; continuing with partial listing"
                        );
                        return Ok((items, true));
                    }
                    debug!(attempt, status, body = %body, "Retrying page after server error");
                }
                Err(e) => return Err(e),
            }
        };

        pages += 1;
        if page.docs.is_empty() {
            break;
        }
        items.extend(page.docs);

        match page.bookmark.filter(|b| !b.is_empty()) {
            Some(next) if seen_bookmarks.insert(next.clone()) => bookmark = Some(next),
            _ => break,
        }
    }

    debug!(pages, fetched = items.len(), "Pagination complete");
    Ok((items, false))
}

impl RemoteGateway for MochiClient {
    async fn list_decks(&self) -> Result<Vec<RemoteDeck>> {
        let response = check("list decks", self.get("decks/").send().await?).await?;
        let list: DeckList = response.json().await?;
        Ok(list.docs)
    }

    async fn get_deck(&self, deck_id: &str) -> Result<RemoteDeck> {
        let response = check("get deck", self.get(&format!("decks/{deck_id}")).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn list_cards(&self, deck_id: &str, page_size: usize) -> Result<CardListing> {
        let (raw, truncated) =
            paginate(|bookmark| self.fetch_card_page(deck_id, page_size, bookmark)).await?;
        Ok(CardListing {
            cards: raw.into_iter().map(Card::from).collect(),
            truncated,
        })
    }

    async fn create_card(&self, deck_id: &str, payload: &CardPayload) -> Result<String> {
        let request = CreateCardRequest { deck_id, payload };
        let response = check("create card", self.post("cards/").json(&request).send().await?).await?;
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    async fn update_card(&self, card_id: &str, payload: &CardPayload) -> Result<()> {
        let response = self
            .post(&format!("cards/{card_id}"))
            .json(payload)
            .send()
            .await?;
        check("update card", response).await?;
        Ok(())
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("cards/{card_id}")))
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;
        check("delete card", response).await?;
        Ok(())
    }

    async fn create_deck(&self, name: &str) -> Result<String> {
        let request = CreateDeckRequest { name };
        let response = check("create deck", self.post("decks/").json(&request).send().await?).await?;
        let created: Created = response.json().await?;
        Ok(created.id)
    }
}
