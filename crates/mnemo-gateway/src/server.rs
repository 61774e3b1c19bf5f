// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use mnemo_config::MnemoConfig;
use mnemo_core::{MemoryEngine, MnemoError};

use crate::handlers;

/// Builds a memory engine from a configuration.
///
/// Used once at startup and again on every `POST /configure`.
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    async fn build(&self, config: &MnemoConfig) -> Result<Arc<dyn MemoryEngine>, MnemoError>;
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    engine: Arc<ArcSwap<Arc<dyn MemoryEngine>>>,
    config: Arc<ArcSwap<MnemoConfig>>,
    factory: Arc<dyn EngineFactory>,
    reconfigure: Arc<Mutex<()>>,
}

impl GatewayState {
    /// Creates state around an already built engine.
    pub fn new(
        engine: Arc<dyn MemoryEngine>,
        config: MnemoConfig,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
            config: Arc::new(ArcSwap::from_pointee(config)),
            factory,
            reconfigure: Arc::new(Mutex::new(())),
        }
    }

    /// The engine serving requests right now.
    ///
    /// Requests that loaded the engine before a swap finish on it.
    pub fn engine(&self) -> Arc<dyn MemoryEngine> {
        Arc::clone(&**self.engine.load())
    }

    /// The configuration the current engine was built from.
    pub fn config(&self) -> Arc<MnemoConfig> {
        self.config.load_full()
    }

    /// Merges `overrides` over the current configuration, builds a new engine
    /// and swaps it in. On any failure the running engine is kept.
    pub async fn reconfigure(&self, overrides: &serde_json::Value) -> Result<(), MnemoError> {
        let _guard = self.reconfigure.lock().await;

        let current = self.config.load_full();
        let next = mnemo_config::apply_overrides(&current, overrides)
            .map_err(|errors| mnemo_config::diagnostic::into_mnemo_error(&errors))?;
        let engine = self.factory.build(&next).await?;

        let previous = self.engine.swap(Arc::new(engine));
        self.config.store(Arc::new(next));
        tracing::info!(previous = previous.name(), "memory engine reconfigured");
        Ok(())
    }
}

/// Builds the gateway router over `state`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/configure", post(handlers::configure))
        .route(
            "/memories",
            post(handlers::add_memories)
                .get(handlers::get_all_memories)
                .delete(handlers::delete_all_memories),
        )
        .route(
            "/memories/{memory_id}",
            get(handlers::get_memory)
                .put(handlers::update_memory)
                .delete(handlers::delete_memory),
        )
        .route("/memories/{memory_id}/history", get(handlers::memory_history))
        .route("/search", post(handlers::search_memories))
        .route("/graph/neighborhood", post(handlers::graph_neighborhood))
        .route("/reset", post(handlers::reset_memories))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Serves until `shutdown` is cancelled, then drains in-flight requests.
pub async fn start_server(
    addr: &str,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MnemoError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MnemoError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| addr.to_string());
    tracing::info!("Gateway server listening on {local}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| MnemoError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
