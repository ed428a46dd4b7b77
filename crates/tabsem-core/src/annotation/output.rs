//! Annotation output document
//!
//! The wire shape of a finished run: the raw-table echo, the annotated
//! block (CEA/CTA/CPA with labels and prefixed URIs) and the timing
//! breakdown. Path relations render by substituting each predicate hop
//! with its KB label / URI.

use serde::{Deserialize, Serialize};

use super::relation::RelationExpr;
use crate::kb::KnowledgeBase;

/// Label used when an entity has no English label in the store.
pub const NO_LABEL: &str = "No English Label";

// ============================================================================
// ANNOTATION ENTRIES
// ============================================================================

/// Entity annotation for one cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeaEntry {
    pub row: usize,
    pub column: usize,
    pub annotation: EntityAnnotation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnnotation {
    pub label: String,
    pub uri: String,
    pub score: f64,
}

/// Type annotations for one column (primary types plus supertype
/// secondaries).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaEntry {
    pub column: usize,
    pub annotation: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnnotation {
    pub label: String,
    pub uri: String,
    pub score: f64,
    pub coverage: f64,
}

/// Relation annotation for one ordered column pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpaEntry {
    pub head_column: usize,
    pub tail_column: usize,
    pub annotation: RelationAnnotation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAnnotation {
    pub label: String,
    pub uri: String,
    pub score: f64,
    pub coverage: f64,
}

// ============================================================================
// DOCUMENT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEcho {
    pub table_data_raw: Vec<Vec<String>>,
}

/// The annotated block; absent when the engine failed to initialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTable {
    pub table_data_revised: Vec<Vec<String>>,
    #[serde(rename = "CEA")]
    pub cea: Vec<CeaEntry>,
    #[serde(rename = "CTA")]
    pub cta: Vec<CtaEntry>,
    #[serde(rename = "CPA")]
    pub cpa: Vec<CpaEntry>,
}

/// Timing breakdown in seconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub preprocessing_time: f64,
    pub lookup_time: f64,
    pub entity_scoring_time: f64,
    pub subgraph_construction_time: f64,
    pub cea_task_time: f64,
    pub cta_task_time: f64,
    pub cpa_task_time: f64,
}

/// Complete output of one table run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationOutput {
    pub raw: RawEcho,
    /// Present only when the engine initialized and annotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated: Option<AnnotatedTable>,
    #[serde(flatten)]
    pub timings: TimingBreakdown,
    pub avg_lookup_candidate: f64,
    /// Mentions whose lookup entries were malformed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abnormal_mentions: Vec<String>,
}

// ============================================================================
// RENDERING
// ============================================================================

/// Round to two decimals, as emitted on the wire.
pub fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Label of an entity, with the no-label fallback.
pub fn entity_label(kb: &dyn KnowledgeBase, id: &str) -> String {
    kb.labels(id)
        .ok()
        .and_then(|l| l.label)
        .unwrap_or_else(|| NO_LABEL.to_string())
}

/// Render a relation expression hop by hop: each predicate id is replaced
/// by its KB label (resp. prefixed URI), direction markers and the `::`
/// joiner preserved.
pub fn relation_label_and_uri(kb: &dyn KnowledgeBase, expr: &RelationExpr) -> (String, String) {
    let render = |with: &dyn Fn(&str) -> String| {
        expr.predicates()
            .iter()
            .map(|p| {
                let body = if kb.is_valid_id(&p.pid) {
                    with(&p.pid)
                } else {
                    p.pid.clone()
                };
                if p.inverse {
                    format!("(-){body}")
                } else {
                    body
                }
            })
            .collect::<Vec<_>>()
            .join("::")
    };
    let label = render(&|pid| entity_label(kb, pid));
    let uri = render(&|pid| kb.uri(pid));
    (label, uri)
}

// ============================================================================
// TESTS
// ============================================================================
