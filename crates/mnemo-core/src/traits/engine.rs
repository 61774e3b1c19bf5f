// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory engine trait consumed by the REST gateway.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AddResponse, HistoryEntry, MemoryItem, MemoryList, MemoryScope, Message, ScopeFilters,
    RelationRow, SearchOptions, SearchResponse,
};

/// Storage and retrieval of conversational memories.
#[async_trait]
pub trait MemoryEngine: PluginAdapter {
    /// Stores memories derived from `messages` under `scope`.
    async fn add(
        &self,
        messages: Vec<Message>,
        scope: MemoryScope,
        metadata: Option<serde_json::Value>,
    ) -> Result<AddResponse, MnemoError>;

    /// Fetches one memory by id.
    async fn get(&self, memory_id: &str) -> Result<MemoryItem, MnemoError>;

    /// Lists every memory in `scope`.
    async fn get_all(&self, scope: MemoryScope) -> Result<MemoryList, MnemoError>;

    /// Ranks scoped memories against `query` and expands related graph facts.
    async fn search(&self, query: &str, options: SearchOptions)
    -> Result<SearchResponse, MnemoError>;

    /// Replaces the text of a memory.
    async fn update(&self, memory_id: &str, data: &str) -> Result<(), MnemoError>;

    /// Deletes one memory.
    async fn delete(&self, memory_id: &str) -> Result<(), MnemoError>;

    /// Deletes every memory in `scope`.
    async fn delete_all(&self, scope: MemoryScope) -> Result<(), MnemoError>;

    /// Returns the change log of a memory, oldest first.
    async fn history(&self, memory_id: &str) -> Result<Vec<HistoryEntry>, MnemoError>;

    /// Wipes all memories and history.
    async fn reset(&self) -> Result<(), MnemoError>;

    /// Direct neighborhood search over the knowledge graph.
    ///
    /// Fails with [`MnemoError::Config`] when no graph store is configured.
    async fn neighborhood(
        &self,
        node_list: &[String],
        filters: &ScopeFilters,
        limit: Option<i64>,
    ) -> Result<Vec<RelationRow>, MnemoError>;
}
