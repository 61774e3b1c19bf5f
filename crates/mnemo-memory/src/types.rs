// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored memory record and vector helpers.

use mnemo_core::types::{MemoryItem, MemoryScope};
use sha2::{Digest, Sha256};

/// A memory as persisted, including its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMemory {
    pub id: String,
    pub content: String,
    /// SHA-256 of `content`, hex encoded.
    pub hash: String,
    pub embedding: Vec<f32>,
    pub metadata: Option<serde_json::Value>,
    pub scope: MemoryScope,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl StoredMemory {
    /// True when the metadata holds every key of `filters` with an equal value.
    pub fn matches_metadata(&self, filters: &serde_json::Map<String, serde_json::Value>) -> bool {
        filters.iter().all(|(key, expected)| {
            self.metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .is_some_and(|actual| actual == expected)
        })
    }

    /// Converts into the API representation, attaching a search score if any.
    pub fn into_item(self, score: Option<f32>) -> MemoryItem {
        MemoryItem {
            id: self.id,
            memory: self.content,
            hash: self.hash,
            metadata: self.metadata,
            score,
            created_at: self.created_at,
            updated_at: self.updated_at,
            scope: self.scope,
        }
    }
}

/// Hex-encoded SHA-256 of memory text.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
