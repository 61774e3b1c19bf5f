// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mnemo service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MnemoError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    GraphStore,
    MemoryEngine,
}

// --- Embedding types ---

/// Input for embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector is produced per entry.
    pub texts: Vec<String>,
}

/// Output of embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One embedding per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of every vector in `embeddings`.
    pub dimensions: usize,
}

// --- Scope types ---

/// Tenant scope for graph queries.
///
/// `user_id` is mandatory for any graph search; it is optional here so that
/// the absence can be reported as a configuration error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilters {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl ScopeFilters {
    /// Scope restricted to a single user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            agent_id: None,
        }
    }

    /// Adds an agent restriction.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Returns the user id, or a configuration error when it is missing or blank.
    pub fn require_user(&self) -> Result<&str, MnemoError> {
        match self.user_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(MnemoError::Config(
                "graph search requires filters.user_id".to_string(),
            )),
        }
    }

    /// Returns the agent id when one is set and non-blank.
    pub fn agent(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Identifiers that partition stored memories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl MemoryScope {
    /// True when at least one identifier is present.
    pub fn is_scoped(&self) -> bool {
        [&self.user_id, &self.agent_id, &self.run_id]
            .iter()
            .any(|id| id.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Fails with [`MnemoError::InvalidRequest`] when no identifier is present.
    pub fn require_any(&self) -> Result<(), MnemoError> {
        if self.is_scoped() {
            Ok(())
        } else {
            Err(MnemoError::InvalidRequest(
                "At least one identifier (user_id, agent_id, run_id) is required.".to_string(),
            ))
        }
    }

    /// Projects the scope onto graph filters (the graph has no run partition).
    pub fn graph_filters(&self) -> ScopeFilters {
        ScopeFilters {
            user_id: self.user_id.clone(),
            agent_id: self.agent_id.clone(),
        }
    }
}

// --- Graph types ---

/// One relationship matched by a neighborhood search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRow {
    pub source: String,
    pub source_id: i64,
    pub relationship: String,
    pub relation_id: i64,
    pub destination: String,
    pub destination_id: i64,
    pub similarity: f64,
}

impl RelationRow {
    /// Identity of the matched edge, independent of the similarity score.
    pub fn edge_key(&self) -> (i64, i64, i64) {
        (self.source_id, self.relation_id, self.destination_id)
    }
}

/// A bound Cypher parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
    FloatList(Vec<f64>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_float_list(&self) -> Option<&[f64]> {
        match self {
            ParamValue::FloatList(v) => Some(v),
            _ => None,
        }
    }
}

/// Parameterized Cypher query text.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl CypherQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    /// Binds a parameter, replacing any previous binding with the same name.
    pub fn param(mut self, name: &str, value: ParamValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

// --- Memory engine types ---

/// A chat message submitted for memory ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message (user, assistant or system).
    pub role: String,
    /// Message content.
    pub content: String,
}

/// Kind of change recorded for a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MemoryEventKind {
    Add,
    Update,
    Delete,
    None,
}

/// A stored memory as returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub memory: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Similarity to the query; only set on search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub scope: MemoryScope,
}

/// Outcome for one message passed to `add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub id: String,
    pub memory: String,
    pub event: MemoryEventKind,
}

/// Response of `add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddResponse {
    pub results: Vec<MemoryEvent>,
}

/// Response of `get_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryList {
    pub results: Vec<MemoryItem>,
}

/// Response of `search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<MemoryItem>,
    #[serde(default)]
    pub relations: Vec<RelationRow>,
}

/// One entry of a memory's change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub memory_id: String,
    pub old_memory: Option<String>,
    pub new_memory: Option<String>,
    pub event: MemoryEventKind,
    pub created_at: String,
    pub is_deleted: bool,
}

/// Search options for `search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(flatten)]
    pub scope: MemoryScope,
    /// Maximum number of memories (and relation rows per node) to return.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Metadata key/value pairs a memory must carry to be returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Map<String, serde_json::Value>>,
}
