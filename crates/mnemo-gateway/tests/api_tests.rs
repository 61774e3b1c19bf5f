// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driving the REST API with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use mnemo_config::MnemoConfig;
use mnemo_core::{MemoryEngine, MnemoError};
use mnemo_gateway::{EngineFactory, GatewayState, router};
use mnemo_graph::{HybridNeighborhoodSearcher, SearcherConfig};
use mnemo_memory::{MemoryService, MemoryStore};
use mnemo_test_utils::{InMemoryGraph, MockEmbedder};

/// Builds an in-memory engine; the graph is attached when `with_graph` is set.
struct TestFactory {
    embedder: Arc<MockEmbedder>,
    graph: Option<Arc<InMemoryGraph>>,
}

#[async_trait]
impl EngineFactory for TestFactory {
    async fn build(&self, config: &MnemoConfig) -> Result<Arc<dyn MemoryEngine>, MnemoError> {
        let store = MemoryStore::open_in_memory().await?;
        let mut service = MemoryService::new(store, self.embedder.clone());
        if let Some(graph) = &self.graph
            && config.graph_store.enabled
        {
            let searcher = HybridNeighborhoodSearcher::new(
                self.embedder.clone(),
                graph.clone(),
                SearcherConfig::from(&config.graph_store),
            )?;
            service = service.with_graph(Arc::new(searcher), config.graph_store.default_limit);
        }
        Ok(Arc::new(service))
    }
}

async fn app_with(factory: TestFactory) -> Router {
    let config = MnemoConfig::default();
    let engine = factory.build(&config).await.unwrap();
    router(GatewayState::new(engine, config, Arc::new(factory)))
}

async fn app() -> Router {
    app_with(TestFactory {
        embedder: Arc::new(MockEmbedder::new(8)),
        graph: None,
    })
    .await
}

fn coffee_graph() -> (Arc<MockEmbedder>, Arc<InMemoryGraph>) {
    let embedder = Arc::new(MockEmbedder::new(3).with_vector("coffee", vec![1.0, 0.0, 0.0]));
    let graph = Arc::new(InMemoryGraph::new());
    let coffee = graph.add_entity("coffee", "alice", None, vec![1.0, 0.0, 0.0]);
    let espresso = graph.add_entity("espresso", "alice", None, vec![0.0, 1.0, 0.0]);
    let beans = graph.add_entity("beans", "alice", None, vec![0.0, 0.0, 1.0]);
    graph.add_edge(coffee, "IS_BREWED_AS", espresso);
    graph.add_edge(beans, "GROUND_INTO", coffee);
    (embedder, graph)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn add(app: &Router, content: &str, user: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/memories",
        Some(json!({
            "messages": [{"role": "user", "content": content}],
            "user_id": user
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["results"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_redirects_to_health() {
    let app = app().await;
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/health");
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = call(&app().await, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn health_degrades_when_graph_store_is_down() {
    let (embedder, graph) = coffee_graph();
    let app = app_with(TestFactory {
        embedder,
        graph: Some(graph.clone()),
    })
    .await;
    graph.set_unhealthy(Some("bolt refused"));

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert!(body["detail"].as_str().unwrap().contains("bolt refused"));
}

#[tokio::test]
async fn memory_lifecycle() {
    let app = app().await;
    let id = add(&app, "Enjoys hiking", "alice").await;

    let (status, body) = call(&app, Method::GET, &format!("/memories/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memory"], "Enjoys hiking");
    assert_eq!(body["user_id"], "alice");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/memories/{id}"),
        Some(json!({"text": "Enjoys trail running"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Memory updated successfully");

    let (_, body) = call(&app, Method::GET, &format!("/memories/{id}/history"), None).await;
    let events: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["event"].as_str().unwrap())
        .collect();
    assert_eq!(events, vec!["ADD", "UPDATE"]);

    let (status, body) = call(&app, Method::DELETE, &format!("/memories/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Memory deleted successfully");

    let (status, body) = call(&app, Method::GET, &format!("/memories/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn identifiers_are_required() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/memories",
        Some(json!({"messages": [{"role": "user", "content": "x"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "At least one identifier (user_id, agent_id, run_id) is required."
    );

    let (status, _) = call(&app, Method::GET, "/memories", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, Method::DELETE, "/memories", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_requires_text_field() {
    let app = app().await;
    let id = add(&app, "Enjoys hiking", "alice").await;
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/memories/{id}"),
        Some(json!({"content": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("'memory' or 'text'"));
}

#[tokio::test]
async fn list_and_delete_by_scope() {
    let app = app().await;
    add(&app, "Enjoys hiking", "alice").await;
    add(&app, "Reads sci-fi", "alice").await;
    add(&app, "Plays piano", "bob").await;

    let (_, body) = call(&app, Method::GET, "/memories?user_id=alice", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (status, body) = call(&app, Method::DELETE, "/memories?user_id=alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All relevant memories deleted");

    let (_, body) = call(&app, Method::GET, "/memories?user_id=alice", None).await;
    assert!(body["results"].as_array().unwrap().is_empty());
    let (_, body) = call(&app, Method::GET, "/memories?user_id=bob", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::POST, "/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All memories reset");
    let (_, body) = call(&app, Method::GET, "/memories?user_id=bob", None).await;
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_returns_scored_results_and_relations() {
    let (embedder, graph) = coffee_graph();
    let app = app_with(TestFactory {
        embedder,
        graph: Some(graph),
    })
    .await;
    add(&app, "coffee", "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/search",
        Some(json!({"query": "coffee", "user_id": "alice", "limit": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["results"][0]["memory"], "coffee");
    assert!(body["results"][0]["score"].as_f64().unwrap() > 0.99);

    let relations = body["relations"].as_array().unwrap();
    assert_eq!(relations.len(), 2);
    let pairs: Vec<(&str, &str)> = relations
        .iter()
        .map(|r| (r["source"].as_str().unwrap(), r["destination"].as_str().unwrap()))
        .collect();
    assert!(pairs.contains(&("coffee", "espresso")));
    assert!(pairs.contains(&("beans", "coffee")));
}

#[tokio::test]
async fn search_filters_on_metadata() {
    let app = app().await;
    for (content, topic) in [("likes tea", "drinks"), ("plays chess", "games")] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/memories",
            Some(json!({
                "messages": [{"role": "user", "content": content}],
                "user_id": "u1",
                "metadata": {"topic": topic}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = call(
        &app,
        Method::POST,
        "/search",
        Some(json!({"query": "tea", "user_id": "u1", "filters": {"topic": "drinks"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["memory"], "likes tea");
    assert_eq!(results[0]["metadata"]["topic"], "drinks");
}

#[tokio::test]
async fn neighborhood_endpoint() {
    let (embedder, graph) = coffee_graph();
    let app = app_with(TestFactory {
        embedder,
        graph: Some(graph),
    })
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/graph/neighborhood",
        Some(json!({"node_list": ["coffee"], "filters": {"user_id": "alice"}, "limit": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["relations"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/graph/neighborhood",
        Some(json!({"node_list": ["coffee"], "filters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("user_id"));
}

#[tokio::test]
async fn neighborhood_graph_failure_is_bad_gateway() {
    let (embedder, graph) = coffee_graph();
    graph.set_failing(true);
    let app = app_with(TestFactory {
        embedder,
        graph: Some(graph),
    })
    .await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/graph/neighborhood",
        Some(json!({"node_list": ["coffee"], "filters": {"user_id": "alice"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn configure_swaps_engine() {
    let (embedder, graph) = coffee_graph();
    let app = app_with(TestFactory {
        embedder,
        graph: Some(graph),
    })
    .await;
    add(&app, "coffee", "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/configure",
        Some(json!({"graph_store": {"enabled": false}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Configuration set successfully");

    // The rebuilt engine has a fresh store and no graph.
    let (_, body) = call(&app, Method::GET, "/memories?user_id=alice", None).await;
    assert!(body["results"].as_array().unwrap().is_empty());
    let (status, _) = call(
        &app,
        Method::POST,
        "/graph/neighborhood",
        Some(json!({"node_list": ["coffee"], "filters": {"user_id": "alice"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn configure_rejects_invalid_settings() {
    let app = app().await;
    let id = add(&app, "Enjoys hiking", "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/configure",
        Some(json!({"graph_store": {"vector_index": "bad-name"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    // Old engine still serves.
    let (status, _) = call(&app, Method::GET, &format!("/memories/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}
