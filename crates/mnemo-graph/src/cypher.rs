// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cypher text and parameter binding for the neighborhood query.
//!
//! Two variants exist: one scoped by `user_id` only, one scoped by both
//! `user_id` and `agent_id`. Each is a `UNION` of an outgoing and an incoming
//! traversal from the vector-index candidates, ordered by similarity and
//! limited to `$limit` rows.

use mnemo_core::types::{CypherQuery, ParamValue};

/// Upper bound for both the candidate pool size and the row limit.
pub const MAX_LIMIT: i64 = 1000;

/// Limit used when the caller does not pass one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Clamp a requested limit into `[1, MAX_LIMIT]`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

/// Inputs bound into one neighborhood query.
#[derive(Debug, Clone)]
pub struct NeighborhoodParams<'a> {
    pub vector_index: &'a str,
    pub embedding: &'a [f32],
    pub user_id: &'a str,
    pub agent_id: Option<&'a str>,
    pub threshold: f64,
    /// Already clamped.
    pub limit: i64,
}

/// Build the parameterized neighborhood query for one node embedding.
///
/// `vector_index` is interpolated into the text and must be a plain
/// identifier; configuration validation enforces that.
pub fn neighborhood_query(p: &NeighborhoodParams<'_>) -> CypherQuery {
    let scope = match p.agent_id {
        Some(_) => Scope::UserAndAgent,
        None => Scope::User,
    };

    let mut query = CypherQuery::new(neighborhood_text(p.vector_index, scope))
        .param(
            "n_embedding",
            ParamValue::FloatList(p.embedding.iter().map(|x| f64::from(*x)).collect()),
        )
        .param("threshold", ParamValue::Float(p.threshold))
        .param("user_id", ParamValue::String(p.user_id.to_string()))
        .param("limit", ParamValue::Int(p.limit))
        .param("k", ParamValue::Int(p.limit));

    if let Some(agent_id) = p.agent_id {
        query = query.param("agent_id", ParamValue::String(agent_id.to_string()));
    }
    query
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    User,
    UserAndAgent,
}

fn neighborhood_text(index: &str, scope: Scope) -> String {
    let (node_filter, entity_props) = match scope {
        Scope::User => ("node.user_id = $user_id", "{user_id: $user_id}"),
        Scope::UserAndAgent => (
            "node.user_id = $user_id AND node.agent_id = $agent_id",
            "{user_id: $user_id, agent_id: $agent_id}",
        ),
    };

    let candidates = format!(
        "CALL vector_search.search(\"{index}\", $k, $n_embedding)\n\
         YIELD node, similarity\n\
         WITH node, similarity\n\
         WHERE {node_filter} AND similarity >= $threshold\n"
    );

    format!(
        "{candidates}\
         MATCH (node)-[r]->(m:Entity {entity_props})\n\
         RETURN node.name AS source, id(node) AS source_id, type(r) AS relationship, id(r) AS relation_id, m.name AS destination, id(m) AS destination_id, similarity\n\
         UNION\n\
         {candidates}\
         MATCH (m:Entity {entity_props})-[r]->(node)\n\
         RETURN m.name AS source, id(m) AS source_id, type(r) AS relationship, id(r) AS relation_id, node.name AS destination, id(node) AS destination_id, similarity\n\
         ORDER BY similarity DESC\n\
         LIMIT $limit;"
    )
}
