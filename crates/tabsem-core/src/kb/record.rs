//! Stored entity records
//!
//! A KB store value decodes to labels, aliases, descriptions and the
//! adjacency: forward predicates map each object to its rank tag (entity
//! objects) or literal-type tag (literal objects); backward predicates,
//! prefixed `(-)`, carry a plain set of subject ids.
//!
//! Decoding is forward-compatible: unknown fields are ignored, missing
//! fields default to empty, and a corrupt blob decodes to the empty record
//! with a warning.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Prefix marking a backward (object → subject) predicate.
pub const INVERSE_PREFIX: &str = "(-)";

/// Statement rank tags. Any other object tag denotes a literal type.
pub fn is_rank_tag(tag: &str) -> bool {
    matches!(tag, "NORMAL" | "PREFERRED" | "DEPRECATED")
}

// ============================================================================
// RECORD TYPES
// ============================================================================

/// Objects reachable through one predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateObjects {
    /// Forward predicate: object → rank tag or literal-type tag.
    Forward(BTreeMap<String, String>),
    /// Backward predicate: set of subject ids (always entities).
    Backward(BTreeSet<String>),
}

impl PredicateObjects {
    pub fn len(&self) -> usize {
        match self {
            PredicateObjects::Forward(m) => m.len(),
            PredicateObjects::Backward(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Adjacency of one entity: predicate id (with optional `(-)` prefix) to its
/// objects. `BTreeMap` keeps iteration deterministic across runs.
pub type Adjacency = BTreeMap<String, PredicateObjects>;

/// A decoded KB store value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub edges: Adjacency,
}

impl EntityRecord {
    /// Decode a stored blob. Corrupt data yields the empty record so a bad
    /// entity never takes the whole table down.
    pub fn decode(entity_id: &str, bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(entity_id, %err, "corrupt KB record, treating as empty");
                Self::default()
            }
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Total edge count across all predicates, both directions. Used as the
    /// node-popularity signal.
    pub fn num_edges(&self) -> u64 {
        self.edges.values().map(|objs| objs.len() as u64).sum()
    }

    /// Forward objects of one predicate, if present.
    pub fn forward(&self, pid: &str) -> Option<&BTreeMap<String, String>> {
        match self.edges.get(pid) {
            Some(PredicateObjects::Forward(m)) => Some(m),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
