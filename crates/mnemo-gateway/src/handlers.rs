// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the memory REST API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use mnemo_core::types::{
    AddResponse, HealthStatus, HistoryEntry, MemoryItem, MemoryList, MemoryScope, Message,
    RelationRow, ScopeFilters, SearchOptions, SearchResponse,
};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for `POST /memories`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// Conversation turns to store.
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub scope: MemoryScope,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Request body for `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(flatten)]
    pub options: SearchOptions,
}

/// Request body for `POST /graph/neighborhood`.
#[derive(Debug, Deserialize)]
pub struct NeighborhoodRequest {
    /// Entity names to search around.
    pub node_list: Vec<String>,
    #[serde(default)]
    pub filters: ScopeFilters,
    /// Per-node result cap; the configured default applies when absent.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Response body for `POST /graph/neighborhood`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NeighborhoodResponse {
    pub relations: Vec<RelationRow>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Binary version.
    pub version: String,
}

/// GET /
pub async fn root() -> Redirect {
    Redirect::temporary("/health")
}

/// GET /health
///
/// 200 while healthy or degraded, 503 otherwise.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let (code, status, detail) = match state.engine().health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, "degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(e.to_string())),
    };
    let body = HealthResponse {
        status: status.to_string(),
        detail,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (code, Json(body)).into_response()
}

/// POST /configure
///
/// Merges the body over the running configuration and rebuilds the engine.
pub async fn configure(
    State(state): State<GatewayState>,
    Json(overrides): Json<serde_json::Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !overrides.is_object() {
        return Err(ApiError::bad_request("configuration must be a JSON object"));
    }
    state.reconfigure(&overrides).await?;
    Ok(MessageResponse::new("Configuration set successfully"))
}

/// POST /memories
pub async fn add_memories(
    State(state): State<GatewayState>,
    Json(body): Json<AddRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let response = state
        .engine()
        .add(body.messages, body.scope, body.metadata)
        .await?;
    Ok(Json(response))
}

/// GET /memories?user_id=&agent_id=&run_id=
pub async fn get_all_memories(
    State(state): State<GatewayState>,
    Query(scope): Query<MemoryScope>,
) -> Result<Json<MemoryList>, ApiError> {
    Ok(Json(state.engine().get_all(scope).await?))
}

/// GET /memories/{memory_id}
pub async fn get_memory(
    State(state): State<GatewayState>,
    Path(memory_id): Path<String>,
) -> Result<Json<MemoryItem>, ApiError> {
    Ok(Json(state.engine().get(&memory_id).await?))
}

/// PUT /memories/{memory_id}
///
/// Accepts `{"memory": "..."}` or `{"text": "..."}`.
pub async fn update_memory(
    State(state): State<GatewayState>,
    Path(memory_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    let text = ["memory", "text"]
        .iter()
        .find_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
        .ok_or_else(|| {
            ApiError::bad_request("Request body must contain a 'memory' or 'text' string")
        })?;
    state.engine().update(&memory_id, text).await?;
    Ok(MessageResponse::new("Memory updated successfully"))
}

/// GET /memories/{memory_id}/history
pub async fn memory_history(
    State(state): State<GatewayState>,
    Path(memory_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    Ok(Json(state.engine().history(&memory_id).await?))
}

/// DELETE /memories/{memory_id}
pub async fn delete_memory(
    State(state): State<GatewayState>,
    Path(memory_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine().delete(&memory_id).await?;
    Ok(MessageResponse::new("Memory deleted successfully"))
}

/// DELETE /memories?user_id=&agent_id=&run_id=
pub async fn delete_all_memories(
    State(state): State<GatewayState>,
    Query(scope): Query<MemoryScope>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine().delete_all(scope).await?;
    Ok(MessageResponse::new("All relevant memories deleted"))
}

/// POST /search
pub async fn search_memories(
    State(state): State<GatewayState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    Ok(Json(state.engine().search(&body.query, body.options).await?))
}

/// POST /graph/neighborhood
pub async fn graph_neighborhood(
    State(state): State<GatewayState>,
    Json(body): Json<NeighborhoodRequest>,
) -> Result<Json<NeighborhoodResponse>, ApiError> {
    let relations = state
        .engine()
        .neighborhood(&body.node_list, &body.filters, body.limit)
        .await?;
    Ok(Json(NeighborhoodResponse { relations }))
}

/// POST /reset
pub async fn reset_memories(
    State(state): State<GatewayState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine().reset().await?;
    Ok(MessageResponse::new("All memories reset"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_flattens_scope() {
        let json = r#"{
            "messages": [{"role": "user", "content": "I like hiking"}],
            "user_id": "alice",
            "metadata": {"source": "chat"}
        }"#;
        let req: AddRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.scope.user_id.as_deref(), Some("alice"));
        assert!(req.scope.agent_id.is_none());
        assert_eq!(req.metadata.unwrap()["source"], "chat");
    }

    #[test]
    fn search_request_reads_limit_and_scope() {
        let json = r#"{"query": "hobbies", "agent_id": "planner", "limit": 5}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.query, "hobbies");
        assert_eq!(req.options.limit, Some(5));
        assert_eq!(req.options.scope.agent_id.as_deref(), Some("planner"));
        assert!(req.options.filters.is_none());
    }

    #[test]
    fn search_request_reads_metadata_filters() {
        let json = r#"{"query": "tea", "user_id": "u1", "filters": {"topic": "drinks"}}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        let filters = req.options.filters.unwrap();
        assert_eq!(filters["topic"], "drinks");
        assert_eq!(req.options.scope.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn neighborhood_request_defaults() {
        let req: NeighborhoodRequest = serde_json::from_str(r#"{"node_list": ["coffee"]}"#).unwrap();
        assert_eq!(req.node_list, vec!["coffee"]);
        assert!(req.filters.user_id.is_none());
        assert!(req.limit.is_none());
    }

    #[test]
    fn health_response_omits_missing_detail() {
        let json = serde_json::to_string(&HealthResponse {
            status: "ok".to_string(),
            detail: None,
            version: "0.1.0".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"ok","version":"0.1.0"}"#);
    }
}
