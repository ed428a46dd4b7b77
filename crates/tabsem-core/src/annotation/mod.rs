//! Annotation results
//!
//! Relation expressions and the output document emitted after the final
//! pipeline pass.

mod output;
mod relation;

pub use output::{
    entity_label, relation_label_and_uri, round2, AnnotatedTable, AnnotationOutput, CeaEntry,
    CpaEntry, CtaEntry, EntityAnnotation, RawEcho, RelationAnnotation, TimingBreakdown,
    TypeAnnotation, NO_LABEL,
};
pub use relation::RelationExpr;
