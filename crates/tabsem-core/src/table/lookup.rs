//! Entity-lookup service interface
//!
//! The fuzzy label → candidate-entity service is an external collaborator;
//! the engine only consumes its response. `EntityLookup` is the seam a
//! deployment plugs its backend into (inverted index, HTTP service, test
//! fixture).

use serde::{Deserialize, Serialize};

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Request body sent to the lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    /// Lowercased mentions to resolve.
    pub labels: Vec<String>,
    /// Lookup index to query.
    pub kb_index: String,
}

/// One candidate entity returned for a mention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntity {
    /// KB identifier.
    pub entity: String,
    /// Similarity of the mention to the entity's labels, when the service
    /// scored it. Absent scores fall back to the engine's own blend.
    #[serde(default)]
    pub score: Option<f64>,
}

/// Per-mention result. A well-formed entry carries `entities`; entries
/// without it are collected as abnormal mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupMatch {
    pub label: String,
    #[serde(default)]
    pub entities: Option<Vec<LookupEntity>>,
}

/// Full lookup response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    #[serde(default)]
    pub execution_time_sec: f64,
    #[serde(default)]
    pub output: Vec<LookupMatch>,
}

// ============================================================================
// SERVICE SEAM
// ============================================================================

/// The external label → candidates service.
pub trait EntityLookup {
    /// Resolve a batch of lowercased mentions. Implementations return the
    /// service response verbatim; the engine handles truncation to K and
    /// malformed entries.
    fn lookup(&self, request: &LookupRequest) -> LookupResponse;
}

/// Canned lookup backed by a fixed table, for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticLookup {
    entries: std::collections::HashMap<String, Vec<LookupEntity>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register candidates for a (lowercased) mention.
    pub fn insert(&mut self, label: impl Into<String>, entities: Vec<LookupEntity>) {
        self.entries.insert(label.into(), entities);
    }
}

impl EntityLookup for StaticLookup {
    fn lookup(&self, request: &LookupRequest) -> LookupResponse {
        let output = request
            .labels
            .iter()
            .filter_map(|label| {
                self.entries.get(label).map(|entities| LookupMatch {
                    label: label.clone(),
                    entities: Some(entities.clone()),
                })
            })
            .collect();
        LookupResponse {
            execution_time_sec: 0.0,
            output,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
