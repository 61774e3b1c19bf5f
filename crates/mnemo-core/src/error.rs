// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo memory service.

use thiserror::Error;

/// The primary error type used across all Mnemo adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors: missing scope filters, invalid settings,
    /// or a capability that cannot be constructed at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure of an external dependency (embedding model, graph store).
    /// Surfaced unchanged; retry is the caller's decision.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local storage errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A requested entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The request was well-formed but semantically invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    /// Builds an [`MnemoError::Upstream`] from a message and an underlying error.
    pub fn upstream<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MnemoError::Upstream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors raised by an external dependency.
    pub fn is_upstream(&self) -> bool {
        matches!(self, MnemoError::Upstream { .. })
    }
}
