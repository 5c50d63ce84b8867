//! OpenRouter embeddings and chat completions.
//!
//! Uses the OpenAI-compatible endpoints with bearer auth.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Embedder, Judge};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";
pub const CHAT_MODEL: &str = "google/gemini-2.5-flash";

const MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenRouter API client.
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterClient {
    /// Create a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(OPENROUTER_BASE_URL, api_key)
    }

    /// Create a client against an explicit API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Curation(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Curation(format!("OpenRouter request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Curation(format!("OpenRouter returned HTTP {status}: {error}")));
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Put embeddings back in input order when the API reports indices.
fn ordered_embeddings(mut data: Vec<EmbeddingItem>) -> Vec<Vec<f32>> {
    if data.iter().all(|item| item.index.is_some()) {
        data.sort_by_key(|item| item.index);
    }
    data.into_iter().map(|item| item.embedding).collect()
}

impl Embedder for OpenRouterClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: texts,
        };
        let response = self.post("embeddings", &request).await?;
        let data: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Curation(format!("Failed to parse embeddings response: {e}")))?;
        Ok(ordered_embeddings(data.data))
    }
}

impl Judge for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
        };
        let response = self.post("chat/completions", &request).await?;
        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Curation(format!("Failed to parse chat response: {e}")))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| Error::Curation("Empty response from model".into()))
    }
}
