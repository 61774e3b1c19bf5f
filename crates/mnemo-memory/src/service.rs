// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory engine: SQLite persistence, embedding search and optional
//! knowledge-graph augmentation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use mnemo_core::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::embedding::EmbeddingAdapter;
use mnemo_core::traits::engine::MemoryEngine;
use mnemo_core::traits::graph::NeighborhoodSearcher;
use mnemo_core::types::{
    AdapterType, AddResponse, EmbeddingInput, HealthStatus, HistoryEntry, MemoryEvent, MemoryEventKind,
    MemoryItem, MemoryList, MemoryScope, Message, RelationRow, ScopeFilters, SearchOptions,
    SearchResponse,
};

use crate::store::MemoryStore;
use crate::types::{StoredMemory, content_hash, cosine_similarity, now_timestamp};

/// Number of memories returned by `search` when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;

/// Graph augmentation attached to a [`MemoryService`].
struct GraphAugmentation {
    searcher: Arc<dyn NeighborhoodSearcher>,
    default_limit: i64,
}

/// Memory engine over a [`MemoryStore`] and an embedding model.
pub struct MemoryService {
    store: MemoryStore,
    embedder: Arc<dyn EmbeddingAdapter>,
    graph: Option<GraphAugmentation>,
}

impl MemoryService {
    /// Creates a service without graph augmentation.
    pub fn new(store: MemoryStore, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            store,
            embedder,
            graph: None,
        }
    }

    /// Enables relation lookup through `searcher`.
    ///
    /// `default_limit` applies when a caller does not pass a limit.
    pub fn with_graph(mut self, searcher: Arc<dyn NeighborhoodSearcher>, default_limit: i64) -> Self {
        self.graph = Some(GraphAugmentation {
            searcher,
            default_limit,
        });
        self
    }

    /// True when graph augmentation is configured.
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    async fn require(&self, memory_id: &str) -> Result<StoredMemory, MnemoError> {
        self.store
            .get(memory_id)
            .await?
            .ok_or_else(|| not_found(memory_id))
    }
}

fn not_found(memory_id: &str) -> MnemoError {
    MnemoError::NotFound {
        kind: "memory".to_string(),
        id: memory_id.to_string(),
    }
}

fn failure(status: Result<HealthStatus, MnemoError>) -> Option<String> {
    match status {
        Ok(HealthStatus::Healthy) => None,
        Ok(HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => Some(reason),
        Err(e) => Some(e.to_string()),
    }
}

/// Drops blank identifiers so they neither match nor partition anything.
fn normalize(scope: MemoryScope) -> MemoryScope {
    let keep = |id: Option<String>| id.filter(|s| !s.trim().is_empty());
    MemoryScope {
        user_id: keep(scope.user_id),
        agent_id: keep(scope.agent_id),
        run_id: keep(scope.run_id),
    }
}

#[async_trait]
impl PluginAdapter for MemoryService {
    fn name(&self) -> &str {
        "memory-service"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MemoryEngine
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        if let Err(e) = self.store.ping().await {
            return Ok(HealthStatus::Unhealthy(format!("history store: {e}")));
        }

        // Storage works; a failing embedder or graph store degrades the service.
        let mut problems = Vec::new();
        if let Some(reason) = failure(self.embedder.health_check().await) {
            problems.push(format!("embedder: {reason}"));
        }
        if let Some(graph) = &self.graph
            && let Some(reason) = failure(graph.searcher.health_check().await)
        {
            problems.push(format!("graph store: {reason}"));
        }

        if problems.is_empty() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(problems.join("; ")))
        }
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        self.embedder.shutdown().await
    }
}

#[async_trait]
impl MemoryEngine for MemoryService {
    async fn add(
        &self,
        messages: Vec<Message>,
        scope: MemoryScope,
        metadata: Option<serde_json::Value>,
    ) -> Result<AddResponse, MnemoError> {
        let scope = normalize(scope);
        scope.require_any()?;

        let facts: Vec<String> = messages
            .into_iter()
            .filter(|m| m.role != "system")
            .map(|m| m.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if facts.is_empty() {
            return Ok(AddResponse::default());
        }

        let mut results = Vec::with_capacity(facts.len());
        let mut pending = Vec::new();
        for fact in facts {
            let hash = content_hash(&fact);
            match self.store.find_by_hash(&scope, &hash).await? {
                Some(id) => results.push(MemoryEvent {
                    id,
                    memory: fact,
                    event: MemoryEventKind::None,
                }),
                None => pending.push((fact, hash)),
            }
        }

        if !pending.is_empty() {
            let texts = pending.iter().map(|(fact, _)| fact.clone()).collect();
            let output = self
                .embedder
                .embed(EmbeddingInput { texts })
                .await?;

            let mut seen = std::collections::HashSet::new();
            for ((fact, hash), embedding) in pending.into_iter().zip(output.embeddings) {
                if !seen.insert(hash.clone()) {
                    continue;
                }
                let memory = StoredMemory {
                    id: uuid::Uuid::new_v4().to_string(),
                    content: fact,
                    hash,
                    embedding,
                    metadata: metadata.clone(),
                    scope: scope.clone(),
                    created_at: now_timestamp(),
                    updated_at: None,
                };
                self.store.insert(&memory).await?;
                results.push(MemoryEvent {
                    id: memory.id,
                    memory: memory.content,
                    event: MemoryEventKind::Add,
                });
            }
        }

        let added = results
            .iter()
            .filter(|e| e.event == MemoryEventKind::Add)
            .count();
        info!(added, total = results.len(), "memories added");
        Ok(AddResponse { results })
    }

    async fn get(&self, memory_id: &str) -> Result<MemoryItem, MnemoError> {
        Ok(self.require(memory_id).await?.into_item(None))
    }

    async fn get_all(&self, scope: MemoryScope) -> Result<MemoryList, MnemoError> {
        let scope = normalize(scope);
        scope.require_any()?;
        let results = self
            .store
            .list(&scope)
            .await?
            .into_iter()
            .map(|m| m.into_item(None))
            .collect();
        Ok(MemoryList { results })
    }

    async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SearchResponse, MnemoError> {
        let scope = normalize(options.scope);
        scope.require_any()?;
        if query.trim().is_empty() {
            return Err(MnemoError::InvalidRequest("query must not be empty".to_string()));
        }
        let limit = options.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);

        let query_vec = self.embedder.embed_one(query).await?;
        let mut scored: Vec<(f32, StoredMemory)> = self
            .store
            .list(&scope)
            .await?
            .into_iter()
            .filter(|m| options.filters.as_ref().is_none_or(|f| m.matches_metadata(f)))
            .map(|m| (cosine_similarity(&query_vec, &m.embedding), m))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        let results: Vec<MemoryItem> = scored
            .into_iter()
            .map(|(score, m)| m.into_item(Some(score)))
            .collect();

        let relations = match (&self.graph, scope.user_id.is_some()) {
            (Some(graph), true) => {
                let graph_limit = options.limit.unwrap_or(graph.default_limit);
                graph
                    .searcher
                    .search(&[query.to_string()], &scope.graph_filters(), graph_limit)
                    .await?
            }
            _ => Vec::new(),
        };

        let response = SearchResponse { results, relations };
        debug!(
            results = response.results.len(),
            relations = response.relations.len(),
            "memory search complete"
        );
        Ok(response)
    }

    async fn update(&self, memory_id: &str, data: &str) -> Result<(), MnemoError> {
        let data = data.trim();
        if data.is_empty() {
            return Err(MnemoError::InvalidRequest("memory text must not be empty".to_string()));
        }
        self.require(memory_id).await?;

        let embedding = self.embedder.embed_one(data).await?;
        if !self
            .store
            .update(memory_id, data, &content_hash(data), &embedding)
            .await?
        {
            return Err(not_found(memory_id));
        }
        Ok(())
    }

    async fn delete(&self, memory_id: &str) -> Result<(), MnemoError> {
        if self.store.delete(memory_id).await? {
            Ok(())
        } else {
            Err(not_found(memory_id))
        }
    }

    async fn delete_all(&self, scope: MemoryScope) -> Result<(), MnemoError> {
        let scope = normalize(scope);
        scope.require_any()?;
        let removed = self.store.delete_scope(&scope).await?;
        info!(removed, "deleted scoped memories");
        Ok(())
    }

    async fn history(&self, memory_id: &str) -> Result<Vec<HistoryEntry>, MnemoError> {
        self.store.history(memory_id).await
    }

    async fn reset(&self) -> Result<(), MnemoError> {
        self.store.reset().await?;
        info!("memory store reset");
        Ok(())
    }

    async fn neighborhood(
        &self,
        node_list: &[String],
        filters: &ScopeFilters,
        limit: Option<i64>,
    ) -> Result<Vec<RelationRow>, MnemoError> {
        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| MnemoError::Config("graph store is not configured".to_string()))?;
        graph
            .searcher
            .search(node_list, filters, limit.unwrap_or(graph.default_limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_graph::{HybridNeighborhoodSearcher, SearcherConfig};
    use mnemo_test_utils::{InMemoryGraph, MockEmbedder};

    fn user(id: &str) -> MemoryScope {
        MemoryScope {
            user_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn msg(role: &str, content: &str) -> Message {
        Message {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    fn embedder() -> Arc<MockEmbedder> {
        Arc::new(
            MockEmbedder::new(3)
                .with_vector("Loves espresso", vec![1.0, 0.0, 0.0])
                .with_vector("Plays chess", vec![0.0, 1.0, 0.0])
                .with_vector("Loves cappuccino", vec![0.9, 0.1, 0.0])
                .with_vector("coffee", vec![1.0, 0.05, 0.0]),
        )
    }

    async fn service() -> (MemoryService, Arc<MockEmbedder>) {
        let embedder = embedder();
        let store = MemoryStore::open_in_memory().await.unwrap();
        (MemoryService::new(store, embedder.clone()), embedder)
    }

    #[tokio::test]
    async fn add_requires_an_identifier() {
        let (svc, _) = service().await;
        let err = svc
            .add(vec![msg("user", "Loves espresso")], MemoryScope::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::InvalidRequest(_)));

        let blank = MemoryScope {
            run_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(svc.add(vec![msg("user", "x")], blank, None).await.is_err());
    }

    #[tokio::test]
    async fn add_skips_system_messages_and_duplicates() {
        let (svc, _) = service().await;
        let first = svc
            .add(
                vec![
                    msg("system", "You are a helpful assistant"),
                    msg("user", "Loves espresso"),
                    msg("assistant", "Plays chess"),
                ],
                user("u1"),
                Some(serde_json::json!({"topic": "hobbies"})),
            )
            .await
            .unwrap();
        assert_eq!(first.results.len(), 2);
        assert!(first.results.iter().all(|e| e.event == MemoryEventKind::Add));

        let again = svc
            .add(vec![msg("user", "Loves espresso")], user("u1"), None)
            .await
            .unwrap();
        assert_eq!(again.results.len(), 1);
        assert_eq!(again.results[0].event, MemoryEventKind::None);
        assert_eq!(again.results[0].id, first.results[0].id);

        // Same text, different user: a new memory.
        let other = svc
            .add(vec![msg("user", "Loves espresso")], user("u2"), None)
            .await
            .unwrap();
        assert_eq!(other.results[0].event, MemoryEventKind::Add);

        let item = svc.get(&first.results[0].id).await.unwrap();
        assert_eq!(item.metadata, Some(serde_json::json!({"topic": "hobbies"})));
    }

    #[tokio::test]
    async fn add_dedupes_within_one_call() {
        let (svc, _) = service().await;
        let resp = svc
            .add(
                vec![msg("user", "Plays chess"), msg("user", "Plays chess")],
                user("u1"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(svc.get_all(user("u1")).await.unwrap().results.len(), 1);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_within_scope() {
        let (svc, _) = service().await;
        svc.add(
            vec![msg("user", "Plays chess"), msg("user", "Loves espresso")],
            user("u1"),
            None,
        )
        .await
        .unwrap();
        svc.add(vec![msg("user", "Loves cappuccino")], user("u2"), None)
            .await
            .unwrap();

        let resp = svc
            .search(
                "coffee",
                SearchOptions {
                    scope: user("u1"),
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].memory, "Loves espresso");
        assert!(resp.results[0].score.unwrap() > 0.9);
        assert!(resp.relations.is_empty());
    }

    #[tokio::test]
    async fn search_applies_metadata_filters() {
        let (svc, _) = service().await;
        svc.add(
            vec![msg("user", "Loves espresso")],
            user("u1"),
            Some(serde_json::json!({"topic": "drinks"})),
        )
        .await
        .unwrap();
        svc.add(
            vec![msg("user", "Plays chess")],
            user("u1"),
            Some(serde_json::json!({"topic": "games"})),
        )
        .await
        .unwrap();

        let filters = serde_json::json!({"topic": "drinks"}).as_object().cloned();
        let resp = svc
            .search(
                "coffee",
                SearchOptions {
                    scope: user("u1"),
                    filters,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let texts: Vec<&str> = resp.results.iter().map(|m| m.memory.as_str()).collect();
        assert_eq!(texts, vec!["Loves espresso"]);

        let unfiltered = svc
            .search("coffee", SearchOptions { scope: user("u1"), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(unfiltered.results.len(), 2);
    }

    #[tokio::test]
    async fn search_rejects_empty_query() {
        let (svc, _) = service().await;
        let err = svc
            .search(" ", SearchOptions { scope: user("u1"), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_rewrites_text_and_history() {
        let (svc, _) = service().await;
        let added = svc
            .add(vec![msg("user", "Plays chess")], user("u1"), None)
            .await
            .unwrap();
        let id = &added.results[0].id;

        svc.update(id, "Plays go").await.unwrap();
        assert_eq!(svc.get(id).await.unwrap().memory, "Plays go");

        let history = svc.history(id).await.unwrap();
        let events: Vec<MemoryEventKind> = history.iter().map(|h| h.event).collect();
        assert_eq!(events, vec![MemoryEventKind::Add, MemoryEventKind::Update]);

        let err = svc.update("missing", "x").await.unwrap_err();
        assert!(matches!(err, MnemoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_and_delete_all() {
        let (svc, _) = service().await;
        let added = svc
            .add(
                vec![msg("user", "Plays chess"), msg("user", "Loves espresso")],
                user("u1"),
                None,
            )
            .await
            .unwrap();

        svc.delete(&added.results[0].id).await.unwrap();
        assert!(matches!(
            svc.get(&added.results[0].id).await.unwrap_err(),
            MnemoError::NotFound { .. }
        ));
        assert!(matches!(
            svc.delete(&added.results[0].id).await.unwrap_err(),
            MnemoError::NotFound { .. }
        ));

        svc.delete_all(user("u1")).await.unwrap();
        assert!(svc.get_all(user("u1")).await.unwrap().results.is_empty());
        assert!(svc.delete_all(MemoryScope::default()).await.is_err());
    }

    #[tokio::test]
    async fn reset_wipes_all_scopes() {
        let (svc, _) = service().await;
        svc.add(vec![msg("user", "Plays chess")], user("u1"), None)
            .await
            .unwrap();
        svc.add(vec![msg("user", "Plays chess")], user("u2"), None)
            .await
            .unwrap();
        svc.reset().await.unwrap();
        assert!(svc.get_all(user("u1")).await.unwrap().results.is_empty());
        assert!(svc.get_all(user("u2")).await.unwrap().results.is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let (svc, embedder) = service().await;
        embedder.set_failing(true);
        let err = svc
            .add(vec![msg("user", "Plays chess")], user("u1"), None)
            .await
            .unwrap_err();
        assert!(err.is_upstream());
        assert!(svc.get_all(user("u1")).await.unwrap().results.is_empty());
    }

    fn graph_service_parts() -> (Arc<MockEmbedder>, Arc<InMemoryGraph>) {
        let embedder = embedder();
        let graph = Arc::new(InMemoryGraph::new());
        let coffee = graph.add_entity("coffee", "u1", None, vec![1.0, 0.05, 0.0]);
        let espresso = graph.add_entity("espresso", "u1", None, vec![0.0, 0.0, 1.0]);
        graph.add_edge(coffee, "IS_BREWED_AS", espresso);
        (embedder, graph)
    }

    #[tokio::test]
    async fn search_adds_relations_for_user_scope() {
        let (embedder, graph) = graph_service_parts();
        let searcher =
            HybridNeighborhoodSearcher::new(embedder.clone(), graph.clone(), SearcherConfig::default())
                .unwrap();
        let svc = MemoryService::new(MemoryStore::open_in_memory().await.unwrap(), embedder)
            .with_graph(Arc::new(searcher), 100);
        assert!(svc.has_graph());

        let resp = svc
            .search("coffee", SearchOptions { scope: user("u1"), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(resp.relations.len(), 1);
        assert_eq!(resp.relations[0].destination, "espresso");

        // Agent-only scope: no user id, so the graph is not consulted.
        let agent_only = MemoryScope {
            agent_id: Some("bot".to_string()),
            ..Default::default()
        };
        let before = graph.executed_queries().len();
        let resp = svc
            .search("coffee", SearchOptions { scope: agent_only, ..Default::default() })
            .await
            .unwrap();
        assert!(resp.relations.is_empty());
        assert_eq!(graph.executed_queries().len(), before);
    }

    #[tokio::test]
    async fn graph_failure_fails_search() {
        let (embedder, graph) = graph_service_parts();
        graph.set_failing(true);
        let searcher =
            HybridNeighborhoodSearcher::new(embedder.clone(), graph, SearcherConfig::default())
                .unwrap();
        let svc = MemoryService::new(MemoryStore::open_in_memory().await.unwrap(), embedder)
            .with_graph(Arc::new(searcher), 100);

        let err = svc
            .search("coffee", SearchOptions { scope: user("u1"), ..Default::default() })
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn unhealthy_graph_store_degrades_health() {
        let (embedder, graph) = graph_service_parts();
        let searcher =
            HybridNeighborhoodSearcher::new(embedder.clone(), graph.clone(), SearcherConfig::default())
                .unwrap();
        let svc = MemoryService::new(MemoryStore::open_in_memory().await.unwrap(), embedder)
            .with_graph(Arc::new(searcher), 100);
        assert_eq!(svc.health_check().await.unwrap(), HealthStatus::Healthy);

        graph.set_unhealthy(Some("bolt refused"));
        match svc.health_check().await.unwrap() {
            HealthStatus::Degraded(reason) => {
                assert!(reason.contains("graph store"), "got {reason}");
                assert!(reason.contains("bolt refused"), "got {reason}");
            }
            other => panic!("expected degraded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn neighborhood_without_graph_is_config_error() {
        let (svc, _) = service().await;
        let err = svc
            .neighborhood(&["coffee".to_string()], &ScopeFilters::user("u1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Config(_)));
    }

    #[tokio::test]
    async fn neighborhood_uses_default_limit() {
        let (embedder, graph) = graph_service_parts();
        let searcher =
            HybridNeighborhoodSearcher::new(embedder.clone(), graph.clone(), SearcherConfig::default())
                .unwrap();
        let svc = MemoryService::new(MemoryStore::open_in_memory().await.unwrap(), embedder)
            .with_graph(Arc::new(searcher), 25);

        let rows = svc
            .neighborhood(&["coffee".to_string()], &ScopeFilters::user("u1"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let q = &graph.executed_queries()[0];
        assert_eq!(q.get("limit").and_then(|v| v.as_int()), Some(25));
    }
}
