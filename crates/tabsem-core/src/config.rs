//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tuning knobs of the disambiguation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationConfig {
    /// Max candidates kept per mention from lookup.
    pub k: usize,
    /// When false, only direct-edge pairs count; no path synthesis through
    /// shared neighbors.
    pub multi_hop_context: bool,
    /// Restrict path synthesis to known-transitive predicates: only paths
    /// that collapse to a transitive predicate are emitted.
    pub transitive_property_only_path: bool,
    /// Adaptive CTA/CPA disambiguation coefficients; when false a constant
    /// 0.25 is used instead.
    pub soft_scoring: bool,
    /// Base weight of entity-column context.
    pub semantic_context_weight: f64,
    /// Base weight of literal-column context. Literal evidence is noisy
    /// (date format ambiguity, unit detection), so it weighs well below the
    /// semantic context.
    pub literal_context_weight: f64,
    /// Per-level weights of the CTA taxonomy (direct type, supertype,
    /// super-supertype).
    pub cta_taxonomy_weights: [f64; 3],
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            k: 20,
            multi_hop_context: true,
            transitive_property_only_path: false,
            soft_scoring: true,
            semantic_context_weight: 1.0,
            literal_context_weight: 0.3,
            cta_taxonomy_weights: [1.0, 0.7, 0.2],
        }
    }
}
