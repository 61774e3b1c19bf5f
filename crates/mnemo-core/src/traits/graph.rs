// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph store and neighborhood search capabilities.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CypherQuery, HealthStatus, RelationRow, ScopeFilters};

/// Parameterized query execution against a graph database.
///
/// The caller owns the query text and parameter binding; the store only
/// executes it and decodes relationship rows. Failures are reported as
/// [`MnemoError::Upstream`].
#[async_trait]
pub trait GraphStore: PluginAdapter {
    /// Executes a read query returning relationship rows.
    async fn query(&self, query: CypherQuery) -> Result<Vec<RelationRow>, MnemoError>;
}

/// Finds the relationships around a set of entities.
///
/// The memory engine depends on this capability rather than on a concrete
/// graph client. Implementations hold no mutable state and may be called
/// concurrently.
#[async_trait]
pub trait NeighborhoodSearcher: Send + Sync + 'static {
    /// Returns relationship rows for every node in `node_list`, in input order.
    ///
    /// Each node's rows are sorted by similarity descending and truncated to
    /// the effective limit.
    async fn search(
        &self,
        node_list: &[String],
        filters: &ScopeFilters,
        limit: i64,
    ) -> Result<Vec<RelationRow>, MnemoError>;

    /// Reports whether the underlying graph store is reachable.
    async fn health_check(&self) -> Result<HealthStatus, MnemoError>;
}
