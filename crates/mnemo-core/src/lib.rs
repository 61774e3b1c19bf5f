// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo memory service.
//!
//! This crate provides the trait definitions, error types, and common types
//! shared by the memory engine, the graph search component and the gateway.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use types::{
    AdapterType, CypherQuery, HealthStatus, MemoryScope, ParamValue, RelationRow, ScopeFilters,
};

pub use traits::{EmbeddingAdapter, GraphStore, MemoryEngine, NeighborhoodSearcher, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryEventKind, MemoryItem};

    #[test]
    fn mnemo_error_has_all_variants() {
        let _config = MnemoError::Config("test".into());
        let _upstream = MnemoError::upstream("embed failed", std::io::Error::other("test"));
        let _storage = MnemoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _not_found = MnemoError::NotFound {
            kind: "memory".into(),
            id: "m1".into(),
        };
        let _invalid = MnemoError::InvalidRequest("test".into());
        let _internal = MnemoError::Internal("test".into());
    }

    #[test]
    fn upstream_helper_keeps_source() {
        let err = MnemoError::upstream("graph query failed", std::io::Error::other("refused"));
        assert!(err.is_upstream());
        assert_eq!(err.to_string(), "upstream error: graph query failed");
        let source = std::error::Error::source(&err).expect("source should be linked");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Embedding,
            AdapterType::GraphStore,
            AdapterType::MemoryEngine,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn require_user_rejects_missing_and_blank() {
        assert!(matches!(
            ScopeFilters::default().require_user(),
            Err(MnemoError::Config(_))
        ));
        let blank = ScopeFilters {
            user_id: Some("  ".into()),
            agent_id: None,
        };
        assert!(blank.require_user().is_err());
        assert_eq!(ScopeFilters::user("u1").require_user().unwrap(), "u1");
    }

    #[test]
    fn blank_agent_is_treated_as_absent() {
        let filters = ScopeFilters::user("u1").with_agent("");
        assert_eq!(filters.agent(), None);
        assert_eq!(ScopeFilters::user("u1").with_agent("a1").agent(), Some("a1"));
    }

    #[test]
    fn memory_scope_requires_an_identifier() {
        assert!(MemoryScope::default().require_any().is_err());
        let scope = MemoryScope {
            run_id: Some("r1".into()),
            ..Default::default()
        };
        assert!(scope.require_any().is_ok());
        assert_eq!(scope.graph_filters(), ScopeFilters::default());
    }

    #[test]
    fn event_kind_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&MemoryEventKind::Add).unwrap(), "\"ADD\"");
        assert_eq!(MemoryEventKind::Delete.to_string(), "DELETE");
    }

    #[test]
    fn memory_item_flattens_scope() {
        let item = MemoryItem {
            id: "m1".into(),
            memory: "likes espresso".into(),
            hash: "abc".into(),
            metadata: None,
            score: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: None,
            scope: MemoryScope {
                user_id: Some("u1".into()),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert!(json.get("agent_id").is_none());
        assert!(json.get("score").is_none());
    }

    #[test]
    fn cypher_query_binds_params() {
        let q = CypherQuery::new("RETURN $k")
            .param("k", ParamValue::Int(3))
            .param("k", ParamValue::Int(4));
        assert_eq!(q.get("k").and_then(ParamValue::as_int), Some(4));
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_graph_store<T: GraphStore>() {}
        fn _assert_searcher<T: NeighborhoodSearcher>() {}
        fn _assert_engine<T: MemoryEngine>() {}
    }
}
