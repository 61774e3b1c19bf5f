// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memgraph graph store over the Bolt protocol.

use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{Graph, Query, Row, query};
use tracing::{debug, info};

use mnemo_config::model::GraphStoreConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::graph::GraphStore;
use mnemo_core::types::{AdapterType, CypherQuery, HealthStatus, ParamValue, RelationRow};

/// Graph store backed by a Memgraph instance with the MAGE vector search module.
pub struct MemgraphStore {
    graph: Graph,
    url: String,
}

impl MemgraphStore {
    /// Connects and verifies the connection with a trivial query.
    ///
    /// Any failure here is a configuration problem: the server refuses to
    /// start with a graph store it cannot reach. neo4rs retries refused
    /// connections, so the whole check is bounded by `timeout`.
    pub async fn connect(
        url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, MnemoError> {
        match tokio::time::timeout(timeout, Self::connect_and_ping(url, username, password)).await {
            Ok(result) => result,
            Err(_) => Err(MnemoError::Config(format!(
                "memgraph at {url} did not answer within {}s",
                timeout.as_secs_f64()
            ))),
        }
    }

    async fn connect_and_ping(url: &str, username: &str, password: &str) -> Result<Self, MnemoError> {
        let graph = Graph::new(url, username, password)
            .await
            .map_err(|e| MnemoError::Config(format!("memgraph connection to {url} failed: {e}")))?;

        let store = Self {
            graph,
            url: url.to_string(),
        };
        store
            .ping()
            .await
            .map_err(|e| MnemoError::Config(format!("memgraph at {url} is not reachable: {e}")))?;

        info!(url, "connected to memgraph");
        Ok(store)
    }

    /// Connects using the `[graph_store]` section.
    pub async fn from_config(config: &GraphStoreConfig) -> Result<Self, MnemoError> {
        Self::connect(
            &config.url,
            &config.username,
            &config.password,
            Duration::from_secs(config.connect_timeout_secs),
        )
        .await
    }

    async fn ping(&self) -> Result<(), MnemoError> {
        let mut stream = self
            .graph
            .execute(query("RETURN 1 AS ok"))
            .await
            .map_err(|e| MnemoError::upstream("memgraph ping failed", e))?;
        stream
            .next()
            .await
            .map_err(|e| MnemoError::upstream("memgraph ping failed", e))?;
        Ok(())
    }
}

/// Converts a parameterized query into a Bolt query.
fn to_bolt(cypher: &CypherQuery) -> Query {
    cypher
        .params
        .iter()
        .fold(query(&cypher.text), |q, (name, value)| match value {
            ParamValue::Int(v) => q.param(name, *v),
            ParamValue::Float(v) => q.param(name, *v),
            ParamValue::String(v) => q.param(name, v.as_str()),
            ParamValue::FloatList(v) => q.param(name, v.clone()),
        })
}

fn decode_row(row: &Row) -> Result<RelationRow, MnemoError> {
    let decode = |e: neo4rs::DeError| MnemoError::upstream("unexpected graph row shape", e);
    Ok(RelationRow {
        source: row.get::<String>("source").map_err(decode)?,
        source_id: row.get::<i64>("source_id").map_err(decode)?,
        relationship: row.get::<String>("relationship").map_err(decode)?,
        relation_id: row.get::<i64>("relation_id").map_err(decode)?,
        destination: row.get::<String>("destination").map_err(decode)?,
        destination_id: row.get::<i64>("destination_id").map_err(decode)?,
        similarity: row.get::<f64>("similarity").map_err(decode)?,
    })
}

#[async_trait]
impl PluginAdapter for MemgraphStore {
    fn name(&self) -> &str {
        "memgraph"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GraphStore
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        match self.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("{}: {e}", self.url))),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl GraphStore for MemgraphStore {
    async fn query(&self, cypher: CypherQuery) -> Result<Vec<RelationRow>, MnemoError> {
        let mut stream = self
            .graph
            .execute(to_bolt(&cypher))
            .await
            .map_err(|e| MnemoError::upstream("graph query failed", e))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| MnemoError::upstream("graph query failed", e))?
        {
            rows.push(decode_row(&row)?);
        }
        debug!(rows = rows.len(), "graph query complete");
        Ok(rows)
    }
}
