// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid neighborhood search: vector-index candidates plus graph traversal.
//!
//! For every node name the searcher embeds the name, asks the graph store for
//! relationships around the nearest same-scope entities, then re-applies the
//! threshold, drops duplicate edges, sorts by similarity descending and
//! truncates to the limit before appending to the output.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use mnemo_config::model::GraphStoreConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::embedding::EmbeddingAdapter;
use mnemo_core::traits::graph::{GraphStore, NeighborhoodSearcher};
use mnemo_core::types::{HealthStatus, RelationRow, ScopeFilters};

use crate::cypher::{self, NeighborhoodParams};

/// Tunables for [`HybridNeighborhoodSearcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearcherConfig {
    /// Name of the vector index queried for candidates.
    pub vector_index: String,
    /// Minimum similarity for a candidate to count as a match.
    pub threshold: f64,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            vector_index: "memzero".to_string(),
            threshold: 0.7,
        }
    }
}

impl From<&GraphStoreConfig> for SearcherConfig {
    fn from(config: &GraphStoreConfig) -> Self {
        Self {
            vector_index: config.vector_index.clone(),
            threshold: config.threshold,
        }
    }
}

/// Neighborhood search over an embedding model and a graph store.
///
/// Holds no mutable state; concurrent calls are independent.
pub struct HybridNeighborhoodSearcher {
    embedder: Arc<dyn EmbeddingAdapter>,
    graph: Arc<dyn GraphStore>,
    config: SearcherConfig,
}

impl std::fmt::Debug for HybridNeighborhoodSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridNeighborhoodSearcher")
            .field("embedder", &self.embedder.name())
            .field("graph", &self.graph.name())
            .field("config", &self.config)
            .finish()
    }
}

impl HybridNeighborhoodSearcher {
    /// Creates a searcher, rejecting settings the query cannot be built from.
    pub fn new(
        embedder: Arc<dyn EmbeddingAdapter>,
        graph: Arc<dyn GraphStore>,
        config: SearcherConfig,
    ) -> Result<Self, MnemoError> {
        if !is_identifier(&config.vector_index) {
            return Err(MnemoError::Config(format!(
                "vector index name `{}` is not a plain identifier",
                config.vector_index
            )));
        }
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(MnemoError::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                config.threshold
            )));
        }

        Ok(Self {
            embedder,
            graph,
            config,
        })
    }

    /// The configured similarity threshold.
    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Runs the embed-and-query round trip for a single node.
    async fn search_node(
        &self,
        node: &str,
        user_id: &str,
        agent_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RelationRow>, MnemoError> {
        let embedding = self.embedder.embed_one(node).await?;

        let query = cypher::neighborhood_query(&NeighborhoodParams {
            vector_index: &self.config.vector_index,
            embedding: &embedding,
            user_id,
            agent_id,
            threshold: self.config.threshold,
            limit,
        });

        let rows = self.graph.query(query).await?;
        let fetched = rows.len();
        let rows = merge_rows(rows, self.config.threshold, limit);
        debug!(node, fetched, kept = rows.len(), "neighborhood search");
        Ok(rows)
    }
}

#[async_trait]
impl NeighborhoodSearcher for HybridNeighborhoodSearcher {
    async fn search(
        &self,
        node_list: &[String],
        filters: &ScopeFilters,
        limit: i64,
    ) -> Result<Vec<RelationRow>, MnemoError> {
        let user_id = filters.require_user()?;
        let agent_id = filters.agent();
        if node_list.is_empty() {
            return Ok(Vec::new());
        }

        let limit = cypher::clamp_limit(limit);
        let mut relations = Vec::new();
        for node in node_list {
            relations.extend(self.search_node(node, user_id, agent_id, limit).await?);
        }
        Ok(relations)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        self.graph.health_check().await
    }
}

/// Post-process one node's rows.
///
/// Drops rows under `threshold`, keeps the highest-similarity row per edge,
/// sorts by similarity descending (stable for ties) and truncates to `limit`.
pub fn merge_rows(rows: Vec<RelationRow>, threshold: f64, limit: i64) -> Vec<RelationRow> {
    let mut merged: Vec<RelationRow> = Vec::with_capacity(rows.len());
    let mut by_edge: HashMap<(i64, i64, i64), usize> = HashMap::new();

    for row in rows.into_iter().filter(|r| r.similarity >= threshold) {
        match by_edge.get(&row.edge_key()) {
            Some(&i) => {
                if row.similarity > merged[i].similarity {
                    merged[i] = row;
                }
            }
            None => {
                by_edge.insert(row.edge_key(), merged.len());
                merged.push(row);
            }
        }
    }

    merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    merged.truncate(usize::try_from(limit).unwrap_or(0));
    merged
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
