// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid hosts, non-empty paths, similarity ranges and identifiers that
//! end up inside query text.

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

const EMBEDDER_PROVIDERS: &[&str] = &["gemini"];
const GRAPH_PROVIDERS: &[&str] = &["memgraph"];
const GRAPH_URL_SCHEMES: &[&str] = &["bolt://", "bolt+s://", "bolt+ssc://", "neo4j://", "neo4j+s://"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level `{}` must be one of {}",
                config.server.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.store.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "store.database_path must not be empty".to_string(),
        });
    }

    if !EMBEDDER_PROVIDERS.contains(&config.embedder.provider.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "embedder.provider `{}` is not supported (expected one of {})",
                config.embedder.provider,
                EMBEDDER_PROVIDERS.join(", ")
            ),
        });
    }

    if config.embedder.dimensions == 0 {
        errors.push(ConfigError::Validation {
            message: "embedder.dimensions must be greater than 0".to_string(),
        });
    }

    let graph = &config.graph_store;
    if !(0.0..=1.0).contains(&graph.threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "graph_store.threshold must be between 0.0 and 1.0, got {}",
                graph.threshold
            ),
        });
    }

    if !is_identifier(&graph.vector_index) {
        errors.push(ConfigError::Validation {
            message: format!(
                "graph_store.vector_index `{}` must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*)",
                graph.vector_index
            ),
        });
    }

    if graph.enabled {
        if !GRAPH_PROVIDERS.contains(&graph.provider.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "graph_store.provider `{}` is not supported (expected one of {})",
                    graph.provider,
                    GRAPH_PROVIDERS.join(", ")
                ),
            });
        }

        if !GRAPH_URL_SCHEMES.iter().any(|s| graph.url.starts_with(s)) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "graph_store.url `{}` must use one of {}",
                    graph.url,
                    GRAPH_URL_SCHEMES.join(", ")
                ),
            });
        }

        if graph.connect_timeout_secs == 0 {
            errors.push(ConfigError::Validation {
                message: "graph_store.connect_timeout_secs must be greater than 0".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Matches `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
