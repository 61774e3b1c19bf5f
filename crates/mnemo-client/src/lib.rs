// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async HTTP client for the Mnemo memory service.
//!
//! ```no_run
//! # async fn demo() -> Result<(), mnemo_client::ClientError> {
//! use mnemo_client::MemoryClient;
//! use mnemo_core::types::{MemoryScope, Message};
//!
//! let client = MemoryClient::new("http://localhost:8100")?;
//! let scope = MemoryScope { user_id: Some("alice".into()), ..Default::default() };
//! client
//!     .add(vec![Message { role: "user".into(), content: "Likes tea".into() }], scope, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnemo_core::types::{
    AddResponse, HistoryEntry, MemoryItem, MemoryList, MemoryScope, Message, RelationRow,
    ScopeFilters, SearchOptions, SearchResponse,
};

/// Server address used by [`MemoryClient::default_host`].
pub const DEFAULT_HOST: &str = "http://localhost:8100";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors returned by [`MemoryClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The request could not be sent or the response could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The base URL or a path segment could not be turned into a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Serialize)]
struct AddBody<'a> {
    messages: &'a [Message],
    #[serde(flatten)]
    scope: &'a MemoryScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Value>,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    #[serde(flatten)]
    options: &'a SearchOptions,
}

#[derive(Serialize)]
struct NeighborhoodBody<'a> {
    node_list: &'a [String],
    filters: &'a ScopeFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct Relations {
    relations: Vec<RelationRow>,
}

#[derive(Deserialize)]
struct Acknowledgement {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Service health as reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub version: String,
}

/// Client for the memory REST API.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    http: reqwest::Client,
    base: Url,
}

impl MemoryClient {
    /// Creates a client for the server at `host`.
    pub fn new(host: &str) -> Result<Self, ClientError> {
        Self::with_timeout(host, DEFAULT_TIMEOUT)
    }

    /// Creates a client for [`DEFAULT_HOST`].
    pub fn default_host() -> Result<Self, ClientError> {
        Self::new(DEFAULT_HOST)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(host: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(host.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{host}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(host.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    /// Stores memories from `messages` under `scope`.
    pub async fn add(
        &self,
        messages: Vec<Message>,
        scope: MemoryScope,
        metadata: Option<serde_json::Value>,
    ) -> Result<AddResponse, ClientError> {
        let body = AddBody {
            messages: &messages,
            scope: &scope,
            metadata: metadata.as_ref(),
        };
        self.send(Method::POST, self.url(&["memories"], None)?, Some(&body))
            .await
    }

    /// Fetches one memory.
    pub async fn get(&self, memory_id: &str) -> Result<MemoryItem, ClientError> {
        self.send::<(), _>(Method::GET, self.url(&["memories", memory_id], None)?, None)
            .await
    }

    /// Lists the memories in `scope`.
    pub async fn get_all(&self, scope: &MemoryScope) -> Result<MemoryList, ClientError> {
        self.send::<(), _>(Method::GET, self.url(&["memories"], Some(scope))?, None)
            .await
    }

    /// Searches memories, returning graph relations when the server has them.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ClientError> {
        let body = SearchBody { query, options };
        self.send(Method::POST, self.url(&["search"], None)?, Some(&body))
            .await
    }

    /// Replaces the text of a memory.
    pub async fn update(&self, memory_id: &str, text: &str) -> Result<String, ClientError> {
        let body = serde_json::json!({ "text": text });
        let ack: Acknowledgement = self
            .send(Method::PUT, self.url(&["memories", memory_id], None)?, Some(&body))
            .await?;
        Ok(ack.message)
    }

    /// Deletes one memory.
    pub async fn delete(&self, memory_id: &str) -> Result<String, ClientError> {
        let ack: Acknowledgement = self
            .send::<(), _>(Method::DELETE, self.url(&["memories", memory_id], None)?, None)
            .await?;
        Ok(ack.message)
    }

    /// Deletes every memory in `scope`.
    pub async fn delete_all(&self, scope: &MemoryScope) -> Result<String, ClientError> {
        let ack: Acknowledgement = self
            .send::<(), _>(Method::DELETE, self.url(&["memories"], Some(scope))?, None)
            .await?;
        Ok(ack.message)
    }

    /// Returns the change log of a memory.
    pub async fn history(&self, memory_id: &str) -> Result<Vec<HistoryEntry>, ClientError> {
        self.send::<(), _>(
            Method::GET,
            self.url(&["memories", memory_id, "history"], None)?,
            None,
        )
        .await
    }

    /// Wipes every memory on the server.
    pub async fn reset(&self) -> Result<String, ClientError> {
        let ack: Acknowledgement = self
            .send::<(), _>(Method::POST, self.url(&["reset"], None)?, None)
            .await?;
        Ok(ack.message)
    }

    /// Runs a neighborhood search over the server's knowledge graph.
    pub async fn neighborhood(
        &self,
        node_list: &[String],
        filters: &ScopeFilters,
        limit: Option<i64>,
    ) -> Result<Vec<RelationRow>, ClientError> {
        let body = NeighborhoodBody {
            node_list,
            filters,
            limit,
        };
        let out: Relations = self
            .send(Method::POST, self.url(&["graph", "neighborhood"], None)?, Some(&body))
            .await?;
        Ok(out.relations)
    }

    /// Merges `overrides` into the server configuration.
    pub async fn configure(&self, overrides: &serde_json::Value) -> Result<String, ClientError> {
        let ack: Acknowledgement = self
            .send(Method::POST, self.url(&["configure"], None)?, Some(overrides))
            .await?;
        Ok(ack.message)
    }

    /// Reads the server health.
    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.send::<(), _>(Method::GET, self.url(&["health"], None)?, None)
            .await
    }

    fn url(&self, segments: &[&str], scope: Option<&MemoryScope>) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(scope) = scope {
            let pairs = [
                ("user_id", &scope.user_id),
                ("agent_id", &scope.agent_id),
                ("run_id", &scope.run_id),
            ];
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                if let Some(value) = value {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        debug!(%method, %url, "mnemo request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(ErrorBody {
                    detail: serde_json::Value::String(s),
                }) => s,
                Ok(ErrorBody { detail }) => detail.to_string(),
                Err(_) => text,
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response.json().await?)
    }
}
