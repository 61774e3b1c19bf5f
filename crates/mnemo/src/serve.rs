// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mnemo serve` command implementation.
//!
//! Builds the memory engine (SQLite store, Gemini embedder and, when enabled,
//! the Memgraph-backed neighborhood searcher) and serves the REST gateway
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use mnemo_config::MnemoConfig;
use mnemo_core::traits::embedding::EmbeddingAdapter;
use mnemo_core::{MemoryEngine, MnemoError};
use mnemo_gateway::{EngineFactory, GatewayState};

use crate::shutdown;

/// Builds [`MemoryService`](mnemo_memory::MemoryService) engines from configuration.
///
/// The embedder is created from `[embedder]` unless one is supplied.
#[derive(Default)]
pub struct ServiceFactory {
    embedder: Option<Arc<dyn EmbeddingAdapter>>,
}

#[async_trait]
impl EngineFactory for ServiceFactory {
    async fn build(&self, config: &MnemoConfig) -> Result<Arc<dyn MemoryEngine>, MnemoError> {
        let service = match &self.embedder {
            Some(embedder) => mnemo_memory::build_service_with(config, embedder.clone()).await?,
            None => mnemo_memory::build_service(config).await?,
        };
        Ok(Arc::new(service))
    }
}

/// Runs the `mnemo serve` command.
pub async fn run_serve(config: MnemoConfig) -> Result<(), MnemoError> {
    init_tracing(&config.server.log_level);

    let factory = Arc::new(ServiceFactory::default());
    let engine = factory.build(&config).await?;
    info!(
        graph_store = config.graph_store.enabled,
        embedder = %config.embedder.model,
        "memory engine initialized"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = GatewayState::new(engine, config, factory);
    let cancel = shutdown::install_signal_handler();

    mnemo_gateway::start_server(&addr, state.clone(), cancel).await?;

    state.engine().shutdown().await?;
    log_heap_stats();
    info!("mnemo serve shutdown complete");
    Ok(())
}

#[cfg(not(target_env = "msvc"))]
fn log_heap_stats() {
    let _ = tikv_jemalloc_ctl::epoch::advance();
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
    let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
    info!(
        allocated_mb = allocated / (1024 * 1024),
        resident_mb = resident / (1024 * 1024),
        "final heap usage"
    );
}

#[cfg(target_env = "msvc")]
fn log_heap_stats() {}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mnemo={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::types::{MemoryScope, Message};
    use mnemo_test_utils::{MockEmbedder, temp_db};

    fn config(path: &str) -> MnemoConfig {
        let mut config = MnemoConfig::default();
        config.store.database_path = path.to_string();
        config.graph_store.enabled = false;
        config
    }

    fn factory() -> ServiceFactory {
        ServiceFactory {
            embedder: Some(Arc::new(MockEmbedder::new(4))),
        }
    }

    #[tokio::test]
    async fn factory_builds_working_engine() {
        let (_dir, path) = temp_db();
        let factory = factory();
        let engine = factory.build(&config(&path)).await.unwrap();

        let scope = MemoryScope {
            run_id: Some("r1".into()),
            ..Default::default()
        };
        engine
            .add(
                vec![Message {
                    role: "user".into(),
                    content: "Books flights on Fridays".into(),
                }],
                scope.clone(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(engine.get_all(scope).await.unwrap().results.len(), 1);
    }

    #[tokio::test]
    async fn factory_fails_fast_on_unreachable_graph() {
        let (_dir, path) = temp_db();
        let mut config = config(&path);
        config.graph_store.enabled = true;
        config.graph_store.url = "bolt://127.0.0.1:1".into();
        config.graph_store.connect_timeout_secs = 1;

        let factory = factory();
        let err = factory.build(&config).await.err().expect("should fail");
        assert!(matches!(err, MnemoError::Config(_)));
    }
}
