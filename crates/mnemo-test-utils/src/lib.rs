// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests without
//! an embedding API or a running Memgraph instance.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Embedding adapter with pinned vectors per text
//! - [`InMemoryGraph`] - Graph store that evaluates neighborhood queries in memory

pub mod graph;
pub mod mock_embedder;

pub use graph::InMemoryGraph;
pub use mock_embedder::MockEmbedder;

/// Create a temporary directory holding a SQLite path for a test.
///
/// The directory is removed when the returned guard is dropped.
pub fn temp_db() -> (tempfile::TempDir, String) {
    let dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("mnemo-test.db").to_string_lossy().to_string();
    (dir, path)
}
