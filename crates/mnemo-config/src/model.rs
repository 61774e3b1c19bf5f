// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo memory service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Placeholder printed instead of secrets in `Debug` output.
const REDACTED: &str = "[redacted]";

/// Top-level Mnemo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Local memory store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding model settings.
    #[serde(default)]
    pub embedder: EmbedderConfig,

    /// Knowledge graph settings.
    #[serde(default)]
    pub graph_store: GraphStoreConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. 0 picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8100
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Memory store configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database holding memories and their history.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemo").join("history.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("history.db"))
        .display()
        .to_string()
}

/// Embedding model configuration.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderConfig {
    /// Embedding provider. Only `gemini` is supported.
    #[serde(default = "default_embedder_provider")]
    pub provider: String,

    /// Model identifier passed to the provider.
    #[serde(default = "default_embedder_model")]
    pub model: String,

    /// Output dimensionality requested from the model.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Provider API key. Falls back to `GOOGLE_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root URL.
    #[serde(default = "default_embedder_base_url")]
    pub base_url: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: default_embedder_provider(),
            model: default_embedder_model(),
            dimensions: default_dimensions(),
            api_key: None,
            base_url: default_embedder_base_url(),
        }
    }
}

impl std::fmt::Debug for EmbedderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl EmbedderConfig {
    /// Returns the configured API key, or `GOOGLE_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_embedder_provider() -> String {
    "gemini".to_string()
}

fn default_embedder_model() -> String {
    "models/text-embedding-004".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_embedder_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Knowledge graph configuration.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GraphStoreConfig {
    /// Enable graph augmentation of search results.
    #[serde(default = "default_graph_enabled")]
    pub enabled: bool,

    /// Graph provider. Only `memgraph` is supported.
    #[serde(default = "default_graph_provider")]
    pub provider: String,

    /// Bolt URL of the graph database.
    #[serde(default = "default_graph_url")]
    pub url: String,

    #[serde(default = "default_graph_username")]
    pub username: String,

    #[serde(default = "default_graph_password")]
    pub password: String,

    /// Name of the vector index over entity embeddings.
    #[serde(default = "default_vector_index")]
    pub vector_index: String,

    /// Minimum similarity for a node to count as a match.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Limit used when a search request does not specify one.
    #[serde(default = "default_graph_limit")]
    pub default_limit: i64,

    /// Seconds to wait for the startup connection check before giving up.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_graph_enabled(),
            provider: default_graph_provider(),
            url: default_graph_url(),
            username: default_graph_username(),
            password: default_graph_password(),
            vector_index: default_vector_index(),
            threshold: default_threshold(),
            default_limit: default_graph_limit(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GraphStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStoreConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("vector_index", &self.vector_index)
            .field("threshold", &self.threshold)
            .field("default_limit", &self.default_limit)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn default_graph_enabled() -> bool {
    true
}

fn default_graph_provider() -> String {
    "memgraph".to_string()
}

fn default_graph_url() -> String {
    "bolt://memgraph:7687".to_string()
}

fn default_graph_username() -> String {
    "memory_graph_user".to_string()
}

fn default_graph_password() -> String {
    "mem0ry_graph_P@ss".to_string()
}

fn default_vector_index() -> String {
    "memzero".to_string()
}

fn default_threshold() -> f64 {
    0.7
}

fn default_graph_limit() -> i64 {
    100
}

fn default_connect_timeout_secs() -> u64 {
    10
}
