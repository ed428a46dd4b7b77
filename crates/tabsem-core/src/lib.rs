//! # Tabsem Core
//!
//! Semantic table annotation engine: given a preprocessed table and K
//! candidate entities per cell, iteratively disambiguate against a
//! read-only knowledge base and emit three annotations:
//!
//! - **CEA** (cell–entity): the entity best denoted by each cell
//! - **CTA** (column–type): the types best describing an entity column
//! - **CPA** (column–pair): the relation (or two-hop predicate path) best
//!   describing a directed column pair
//!
//! The engine combines a fingerprinted subgraph cache, pairwise subgraph
//! intersections with popularity-weighted proximity, literal evidence
//! (dates, text, unit-converted quantities) and a four-pass mutual
//! reinforcement schedule between the three tasks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabsem_core::{annotate_table, AnnotationConfig, PreprocessedTable, WikidataKb};
//!
//! let kb = Arc::new(WikidataKb::open(Some("kb.db".into()))?);
//! let preprocessed: PreprocessedTable = serde_json::from_str(&preprocessor_json)?;
//! let output = annotate_table(
//!     kb,
//!     raw_table,
//!     preprocessed,
//!     &lookup_service,
//!     "wikidata_lookup",
//!     AnnotationConfig::default(),
//! )?;
//! println!("{}", serde_json::to_string_pretty(&output)?);
//! ```
//!
//! External collaborators (file loading, preprocessing, the fuzzy lookup
//! service, the KB dump loader) are out of scope; only their interfaces
//! appear here.

// ============================================================================
// MODULES
// ============================================================================

pub mod annotation;
pub mod config;
pub mod engine;
pub mod graph;
pub mod kb;
pub mod scoring;
pub mod table;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Configuration
pub use config::AnnotationConfig;

// Table-side model
pub use table::{
    derive_column_roles, Candidate, Cell, ColumnPair, ColumnRole, ColumnTyping, EntityLookup,
    HeaderInfo, LookupEntity, LookupMatch, LookupRequest, LookupResponse, PreprocessedTable,
    StaticLookup, TypingScore,
};

// KB accessor
pub use kb::{
    Adjacency, EntityLabels, EntityRecord, HierarchicalTypes, KbError, KbStore, KbStoreWriter,
    KnowledgeBase, PredicateObjects, WikidataKb,
};

// Subgraphs
pub use graph::{
    DirectedPredicate, Edge, EdgeInfo, LiteralKind, Subgraph, SubgraphCache, POPULARITY_THRESHOLD,
};

// Scoring kernels
pub use scoring::{blended_similarity, magnitude_similarity, UnitRegistry};

// Engine and results
pub use annotation::{
    AnnotatedTable, AnnotationOutput, CeaEntry, CpaEntry, CtaEntry, RelationExpr, TimingBreakdown,
};
pub use engine::{
    annotate_table, AnnotationEngine, CeaScore, CpaScore, CtaScore, EngineError, EngineTimings,
    RelationCandidate,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        annotate_table, AnnotationConfig, AnnotationEngine, AnnotationOutput, Cell, ColumnPair,
        ColumnRole, EngineError, EntityLookup, KnowledgeBase, LookupEntity, LookupResponse,
        PreprocessedTable, RelationExpr, StaticLookup, WikidataKb,
    };
}
