// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-graph neighborhood search for the Mnemo memory service.
//!
//! Combines a vector-index nearest-neighbor lookup with a one-hop graph
//! traversal in both directions, scoped by `user_id` and optional `agent_id`.
//! The memory engine consumes this through the
//! [`NeighborhoodSearcher`](mnemo_core::NeighborhoodSearcher) capability.

pub mod cypher;
pub mod memgraph;
pub mod searcher;

use std::sync::Arc;

use mnemo_config::model::GraphStoreConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::embedding::EmbeddingAdapter;

pub use cypher::{DEFAULT_LIMIT, MAX_LIMIT, clamp_limit};
pub use memgraph::MemgraphStore;
pub use searcher::{HybridNeighborhoodSearcher, SearcherConfig, merge_rows};

/// Connects to the configured graph store and builds the searcher.
///
/// Returns `Ok(None)` when the graph store is disabled. Any failure is a
/// [`MnemoError::Config`] so startup stops instead of running without it.
pub async fn connect_searcher(
    config: &GraphStoreConfig,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Result<Option<HybridNeighborhoodSearcher>, MnemoError> {
    if !config.enabled {
        return Ok(None);
    }

    let store = MemgraphStore::from_config(config).await?;
    HybridNeighborhoodSearcher::new(embedder, Arc::new(store), SearcherConfig::from(config))
        .map(Some)
}
