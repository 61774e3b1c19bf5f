// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory engine for the Mnemo memory service.
//!
//! ## Architecture
//!
//! - **GeminiEmbedder**: remote embeddings via the Generative Language API
//! - **MemoryStore**: SQLite persistence of memories and their change history
//! - **MemoryService**: the [`MemoryEngine`](mnemo_core::MemoryEngine)
//!   implementation, optionally augmented with knowledge-graph relations
//! - **Types**: StoredMemory plus hashing and vector helpers

pub mod embedder;
pub mod service;
pub mod store;
pub mod types;

use std::sync::Arc;

use tracing::info;

use mnemo_config::model::MnemoConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::embedding::EmbeddingAdapter;

pub use embedder::GeminiEmbedder;
pub use service::MemoryService;
pub use store::MemoryStore;
pub use types::*;

/// Builds a memory service from a validated configuration.
///
/// Opens the history database, creates the embedder and, when the graph
/// store is enabled, connects to it. A graph store that cannot be reached
/// fails the build with [`MnemoError::Config`].
pub async fn build_service(config: &MnemoConfig) -> Result<MemoryService, MnemoError> {
    let embedder: Arc<dyn EmbeddingAdapter> = Arc::new(GeminiEmbedder::from_config(&config.embedder)?);
    build_service_with(config, embedder).await
}

/// Like [`build_service`] with a caller-supplied embedder.
pub async fn build_service_with(
    config: &MnemoConfig,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Result<MemoryService, MnemoError> {
    let store = MemoryStore::open(&config.store.database_path).await?;
    let service = MemoryService::new(store, embedder.clone());

    let service = match mnemo_graph::connect_searcher(&config.graph_store, embedder).await? {
        Some(searcher) => {
            info!(url = %config.graph_store.url, index = %config.graph_store.vector_index, "graph store connected");
            service.with_graph(Arc::new(searcher), config.graph_store.default_limit)
        }
        None => service,
    };

    info!(path = %config.store.database_path, "memory service ready");
    Ok(service)
}
