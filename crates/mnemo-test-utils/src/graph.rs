// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory graph store for deterministic testing.
//!
//! `InMemoryGraph` implements `GraphStore` by evaluating the hybrid
//! neighborhood query against nodes and edges held in memory: a global
//! top-`k` cosine candidate search, scope and threshold filtering, then a
//! bidirectional one-hop traversal restricted to same-scope entities.
//! Every executed query is captured for assertions.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use mnemo_core::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::graph::GraphStore;
use mnemo_core::types::{AdapterType, CypherQuery, HealthStatus, RelationRow};

#[derive(Debug, Clone)]
struct Entity {
    id: i64,
    name: String,
    user_id: String,
    agent_id: Option<String>,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
struct Edge {
    id: i64,
    source: i64,
    relationship: String,
    destination: i64,
}

#[derive(Debug, Default)]
struct GraphState {
    next_id: i64,
    entities: Vec<Entity>,
    edges: Vec<Edge>,
}

/// A mock graph store backed by in-memory entities and edges.
#[derive(Default)]
pub struct InMemoryGraph {
    state: Mutex<GraphState>,
    queries: Mutex<Vec<CypherQuery>>,
    failing: AtomicBool,
    unhealthy: Mutex<Option<String>>,
}

impl InMemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity node and return its id.
    pub fn add_entity(
        &self,
        name: &str,
        user_id: &str,
        agent_id: Option<&str>,
        embedding: Vec<f32>,
    ) -> i64 {
        let mut state = self.state.lock().expect("graph state poisoned");
        let id = state.next_id;
        state.next_id += 1;
        state.entities.push(Entity {
            id,
            name: name.to_string(),
            user_id: user_id.to_string(),
            agent_id: agent_id.map(str::to_string),
            embedding,
        });
        id
    }

    /// Add a directed relationship `source -[relationship]-> destination` and return its id.
    pub fn add_edge(&self, source: i64, relationship: &str, destination: i64) -> i64 {
        let mut state = self.state.lock().expect("graph state poisoned");
        let id = state.next_id;
        state.next_id += 1;
        state.edges.push(Edge {
            id,
            source,
            relationship: relationship.to_string(),
            destination,
        });
        id
    }

    /// Make every subsequent query fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `health_check` report the store as unhealthy with `reason`,
    /// or healthy again with `None`.
    pub fn set_unhealthy(&self, reason: Option<&str>) {
        *self.unhealthy.lock().expect("health state poisoned") = reason.map(str::to_string);
    }

    /// Id of the first entity named `name` owned by `user_id`.
    pub fn entity_id(&self, name: &str, user_id: &str) -> Option<i64> {
        let state = self.state.lock().expect("graph state poisoned");
        state
            .entities
            .iter()
            .find(|e| e.name == name && e.user_id == user_id)
            .map(|e| e.id)
    }

    /// All queries executed so far, in call order.
    pub fn executed_queries(&self) -> Vec<CypherQuery> {
        self.queries.lock().expect("query log poisoned").clone()
    }

    fn evaluate(&self, query: &CypherQuery) -> Result<Vec<RelationRow>, MnemoError> {
        if !query.text.contains("vector_search.search") {
            return Err(unsupported("query text is not a vector neighborhood search"));
        }

        let embedding = query
            .get("n_embedding")
            .and_then(|v| v.as_float_list())
            .ok_or_else(|| unsupported("missing $n_embedding"))?;
        let user_id = query
            .get("user_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| unsupported("missing $user_id"))?;
        let agent_id = query.get("agent_id").and_then(|v| v.as_str());
        let threshold = query
            .get("threshold")
            .and_then(|v| v.as_float())
            .ok_or_else(|| unsupported("missing $threshold"))?;
        let k = query
            .get("k")
            .and_then(|v| v.as_int())
            .ok_or_else(|| unsupported("missing $k"))?;
        let limit = query
            .get("limit")
            .and_then(|v| v.as_int())
            .ok_or_else(|| unsupported("missing $limit"))?;

        let state = self.state.lock().expect("graph state poisoned");
        let in_scope = |e: &Entity| {
            e.user_id == user_id && agent_id.is_none_or(|a| e.agent_id.as_deref() == Some(a))
        };

        // Global top-k by similarity, before any scope filtering.
        let mut candidates: Vec<(&Entity, f64)> = state
            .entities
            .iter()
            .filter(|e| e.embedding.len() == embedding.len())
            .map(|e| (e, cosine(&e.embedding, embedding)))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(usize::try_from(k).unwrap_or(0));

        let entity = |id: i64| state.entities.iter().find(|e| e.id == id);
        let mut rows = Vec::new();
        for (node, similarity) in candidates {
            if !in_scope(node) || similarity < threshold {
                continue;
            }
            for edge in &state.edges {
                if edge.source == node.id
                    && let Some(m) = entity(edge.destination).filter(|m| in_scope(*m))
                {
                    rows.push(row(node, edge, m, similarity));
                }
                if edge.destination == node.id
                    && let Some(m) = entity(edge.source).filter(|m| in_scope(*m))
                {
                    rows.push(row(m, edge, node, similarity));
                }
            }
        }

        // UNION drops rows identical in every column.
        let mut seen = HashSet::new();
        rows.retain(|r: &RelationRow| {
            seen.insert((r.edge_key(), r.similarity.to_bits(), r.source.clone()))
        });
        rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

fn row(source: &Entity, edge: &Edge, destination: &Entity, similarity: f64) -> RelationRow {
    RelationRow {
        source: source.name.clone(),
        source_id: source.id,
        relationship: edge.relationship.clone(),
        relation_id: edge.id,
        destination: destination.name.clone(),
        destination_id: destination.id,
        similarity,
    }
}

fn cosine(a: &[f32], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * y).sum();
    let na: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|y| y * y).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn unsupported(message: &str) -> MnemoError {
    MnemoError::Upstream {
        message: format!("in-memory graph: {message}"),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for InMemoryGraph {
    fn name(&self) -> &str {
        "in-memory-graph"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GraphStore
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        match self.unhealthy.lock().expect("health state poisoned").clone() {
            Some(reason) => Ok(HealthStatus::Unhealthy(reason)),
            None => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn query(&self, query: CypherQuery) -> Result<Vec<RelationRow>, MnemoError> {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(query.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(MnemoError::Upstream {
                message: "graph store unavailable".to_string(),
                source: None,
            });
        }
        self.evaluate(&query)
    }
}
