// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod engine;
pub mod graph;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use engine::MemoryEngine;
pub use graph::{GraphStore, NeighborhoodSearcher};
