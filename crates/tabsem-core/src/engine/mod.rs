//! Disambiguation engine
//!
//! Owns all per-table state: column roles, distributed lookup candidates,
//! similarity/context/final scores, the subgraph and relation caches, and
//! the current CEA/CTA/CPA maps. One engine annotates one table; a process
//! annotates many tables by giving each its own engine over the shared
//! read-only KB accessor.
//!
//! Split across files by concern:
//! - `scoring`: similarity, context and final candidate scoring
//! - `weights`: CPA-driven context reweighting
//! - `cea` / `cta` / `cpa`: the three annotation tasks
//! - `pipeline`: the four-pass driver and output assembly

mod cea;
mod cpa;
mod cta;
mod pipeline;
mod scoring;
mod weights;

pub use pipeline::annotate_table;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::annotation::RelationExpr;
use crate::config::AnnotationConfig;
use crate::graph::SubgraphCache;
use crate::kb::{HierarchicalTypes, KbError, KnowledgeBase};
use crate::scoring::UnitRegistry;
use crate::table::{
    derive_column_roles, Candidate, Cell, ColumnPair, ColumnRole, EntityLookup, LookupRequest,
    PreprocessedTable,
};

/// Minimum fraction of cells with candidates for a column to stay an
/// entity column.
const MIN_LOOKUP_COVERAGE: f64 = 0.3;

/// Mentions this short are not looked up.
const MIN_MENTION_LEN: usize = 2;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The preprocessed table is unusable (empty, ragged, or missing typings)
    #[error("Preprocessing produced no usable table")]
    Preprocessing,
    /// The lookup service returned no candidates for any mention
    #[error("Entity lookup returned no candidates")]
    Lookup {
        /// Mentions whose lookup entries were malformed
        abnormal_mentions: Vec<String>,
    },
    /// KB accessor failure
    #[error(transparent)]
    Kb(#[from] KbError),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// SCORE RECORDS
// ============================================================================

/// A relation candidate between two identifiers (or an identifier and a
/// literal cell text).
#[derive(Debug, Clone, PartialEq)]
pub struct RelationCandidate {
    pub expr: RelationExpr,
    pub semantic_proximity: f64,
}

/// Per-column context of one candidate: the evidence that the candidate
/// fits its row, seen from one other column.
#[derive(Debug, Clone)]
pub struct ContextRecord {
    pub weight: f64,
    /// Sub-score, floored at 0.1.
    pub score: f64,
    /// Relations backing the score.
    pub evidence: Vec<RelationExpr>,
}

impl ContextRecord {
    fn floor(weight: f64) -> Self {
        Self {
            weight,
            score: 0.1,
            evidence: Vec::new(),
        }
    }
}

/// A scored CEA candidate for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CeaScore {
    pub id: String,
    pub score: f64,
}

/// A scored CTA candidate for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CtaScore {
    pub id: String,
    pub score: f64,
    pub coverage: f64,
}

/// A scored CPA candidate for one column pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CpaScore {
    pub expr: RelationExpr,
    pub score: f64,
    pub coverage: f64,
    pub semantic_proximity: f64,
}

/// A CPA accepted for one of the candidate's column pairs that also occurs
/// in the candidate's own predicate set; boosts contextless cells.
#[derive(Debug, Clone)]
pub struct PotentialCpa {
    pub coverage: f64,
    pub score: f64,
    pub expr: RelationExpr,
}

/// Accumulated task timings, in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineTimings {
    pub lookup: f64,
    pub entity_scoring: f64,
    pub subgraph_construction: f64,
    pub cea_task: f64,
    pub cta_task: f64,
    pub cpa_task: f64,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Per-table disambiguation state. Construction runs role derivation, the
/// lookup task and the subgraph prefetch; `annotate` runs the passes.
pub struct AnnotationEngine {
    pub(crate) kb: Arc<dyn KnowledgeBase>,
    pub(crate) config: AnnotationConfig,

    // table geometry and roles
    pub(crate) table: Vec<Vec<String>>,
    pub(crate) first_data_row: usize,
    pub(crate) num_rows: usize,
    pub(crate) num_columns: usize,
    pub(crate) roles: Vec<ColumnRole>,
    pub(crate) entity_cols: Vec<usize>,
    pub(crate) literal_cols: Vec<usize>,

    // lookup distribution
    pub(crate) lookup: BTreeMap<Cell, Vec<String>>,
    pub(crate) lookup_scores: HashMap<Candidate, Option<f64>>,
    pub(crate) all_candidates: Vec<Candidate>,
    pub(crate) abnormal_mentions: Vec<String>,
    pub(crate) avg_lookup_candidate: f64,

    // scores
    pub(crate) sim_scores: HashMap<Candidate, f64>,
    pub(crate) context_scores: HashMap<Candidate, BTreeMap<usize, ContextRecord>>,
    pub(crate) scores: HashMap<Candidate, f64>,

    // caches (engine-lifetime)
    pub(crate) subgraphs: SubgraphCache,
    pub(crate) relation_cache: HashMap<(String, String), Vec<RelationCandidate>>,
    pub(crate) negative_pairs: HashSet<(String, String)>,
    pub(crate) unrelated_col_pairs: HashSet<ColumnPair>,
    pub(crate) type_cache: HashMap<String, HierarchicalTypes>,
    pub(crate) type_graph: HashMap<String, BTreeSet<String>>,

    // last-step bookkeeping
    pub(crate) contextless_cells: HashSet<Cell>,
    pub(crate) potential_candidates: HashMap<Candidate, Vec<PotentialCpa>>,

    // current annotations
    pub(crate) cea_annot: BTreeMap<Cell, Vec<CeaScore>>,
    pub(crate) cta_annot: BTreeMap<usize, Vec<CtaScore>>,
    pub(crate) cpa_annot: BTreeMap<ColumnPair, Vec<CpaScore>>,

    pub(crate) units: UnitRegistry,
    pub(crate) timings: EngineTimings,
}

impl AnnotationEngine {
    /// Build an engine for one preprocessed table. Fails when the table is
    /// unusable or the lookup comes back empty; per-entity KB gaps do not
    /// fail construction.
    pub fn new(
        kb: Arc<dyn KnowledgeBase>,
        preprocessed: PreprocessedTable,
        lookup_service: &dyn EntityLookup,
        lookup_index: &str,
        config: AnnotationConfig,
    ) -> Result<Self> {
        if !preprocessed.is_usable() {
            return Err(EngineError::Preprocessing);
        }

        let first_data_row = preprocessed.first_data_row();
        let num_rows = preprocessed.num_rows();
        let num_columns = preprocessed.num_columns();
        let roles = derive_column_roles(&preprocessed);
        let table = preprocessed.table_data_revised;

        let mut engine = Self {
            kb,
            config,
            table,
            first_data_row,
            num_rows,
            num_columns,
            entity_cols: roles
                .iter()
                .enumerate()
                .filter(|(_, r)| **r == ColumnRole::Entity)
                .map(|(c, _)| c)
                .collect(),
            literal_cols: roles
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_literal())
                .map(|(c, _)| c)
                .collect(),
            roles,
            lookup: BTreeMap::new(),
            lookup_scores: HashMap::new(),
            all_candidates: Vec::new(),
            abnormal_mentions: Vec::new(),
            avg_lookup_candidate: 0.0,
            sim_scores: HashMap::new(),
            context_scores: HashMap::new(),
            scores: HashMap::new(),
            subgraphs: SubgraphCache::new(),
            relation_cache: HashMap::new(),
            negative_pairs: HashSet::new(),
            unrelated_col_pairs: HashSet::new(),
            type_cache: HashMap::new(),
            type_graph: HashMap::new(),
            contextless_cells: HashSet::new(),
            potential_candidates: HashMap::new(),
            cea_annot: BTreeMap::new(),
            cta_annot: BTreeMap::new(),
            cpa_annot: BTreeMap::new(),
            units: UnitRegistry::with_defaults(),
            timings: EngineTimings::default(),
        };

        engine.lookup_task(lookup_service, lookup_index)?;
        engine.initialize_scores();
        engine.build_subgraphs()?;
        Ok(engine)
    }

    pub fn timings(&self) -> EngineTimings {
        self.timings
    }

    pub fn avg_lookup_candidate(&self) -> f64 {
        self.avg_lookup_candidate
    }

    pub fn abnormal_mentions(&self) -> &[String] {
        &self.abnormal_mentions
    }

    pub fn revised_table(&self) -> &[Vec<String>] {
        &self.table
    }

    pub(crate) fn num_data_rows(&self) -> usize {
        self.num_rows - self.first_data_row
    }

    pub(crate) fn is_entity_col(&self, col: usize) -> bool {
        self.roles[col] == ColumnRole::Entity
    }

    /// Orient a (candidate column, context column) pair: entity columns to
    /// the left of the candidate act as heads, everything else as tails.
    pub(crate) fn orient_pair(&self, candidate_col: usize, context_col: usize) -> ColumnPair {
        if context_col < candidate_col && self.is_entity_col(context_col) {
            ColumnPair::new(context_col, candidate_col)
        } else {
            ColumnPair::new(candidate_col, context_col)
        }
    }

    // ------------------------------------------------------------------------
    // INIT: lookup task
    // ------------------------------------------------------------------------

    fn lookup_task(&mut self, service: &dyn EntityLookup, lookup_index: &str) -> Result<()> {
        // distinct lowercased mentions across entity columns
        let mut mentions: BTreeSet<String> = BTreeSet::new();
        for &col in &self.entity_cols {
            for row in self.first_data_row..self.num_rows {
                let mention = self.table[row][col].to_lowercase();
                if mention.chars().count() >= MIN_MENTION_LEN {
                    mentions.insert(mention);
                }
            }
        }

        let response = service.lookup(&LookupRequest {
            labels: mentions.into_iter().collect(),
            kb_index: lookup_index.to_string(),
        });
        self.timings.lookup = response.execution_time_sec;

        let mut results: HashMap<String, Vec<crate::table::LookupEntity>> = HashMap::new();
        for item in response.output {
            match item.entities {
                Some(entities) => {
                    let truncated = entities.into_iter().take(self.config.k).collect();
                    results.insert(item.label, truncated);
                }
                None => self.abnormal_mentions.push(item.label),
            }
        }
        if results.is_empty() {
            return Err(EngineError::Lookup {
                abnormal_mentions: std::mem::take(&mut self.abnormal_mentions),
            });
        }

        // distribute candidates and track per-column coverage
        let num_data_rows = self.num_data_rows().max(1) as f64;
        let mut demoted: Vec<usize> = Vec::new();
        for &col in &self.entity_cols {
            let mut covered = 0usize;
            for row in self.first_data_row..self.num_rows {
                let mention = self.table[row][col].to_lowercase();
                if let Some(entities) = results.get(&mention) {
                    covered += 1;
                    let cell = Cell::new(row, col);
                    let mut ids = Vec::with_capacity(entities.len());
                    for entity in entities {
                        ids.push(entity.entity.clone());
                        self.lookup_scores
                            .insert(Candidate::new(row, col, entity.entity.clone()), entity.score);
                    }
                    self.lookup.insert(cell, ids);
                }
            }
            if (covered as f64) / num_data_rows < MIN_LOOKUP_COVERAGE {
                demoted.push(col);
            }
        }

        // a column whose cells mostly miss the KB is textual, not semantic
        for col in demoted {
            tracing::debug!(col, "demoting entity column with sparse lookup coverage");
            self.roles[col] = ColumnRole::Textual;
            self.entity_cols.retain(|&c| c != col);
            self.literal_cols.push(col);
            self.literal_cols.sort_unstable();
            for row in self.first_data_row..self.num_rows {
                let cell = Cell::new(row, col);
                if let Some(ids) = self.lookup.remove(&cell) {
                    for id in ids {
                        self.lookup_scores.remove(&Candidate::new(row, col, id));
                    }
                }
            }
        }

        let mut total = 0usize;
        for ids in self.lookup.values() {
            total += ids.len();
        }
        if !self.lookup.is_empty() {
            self.avg_lookup_candidate =
                (total as f64 / self.lookup.len() as f64 * 100.0).round() / 100.0;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // INIT: score maps and subgraphs
    // ------------------------------------------------------------------------

    fn initialize_scores(&mut self) {
        for (cell, ids) in &self.lookup {
            for id in ids {
                let candidate = Candidate::new(cell.row, cell.col, id.clone());
                self.sim_scores.insert(candidate.clone(), 0.0);
                self.context_scores.insert(candidate.clone(), BTreeMap::new());
                self.scores.insert(candidate.clone(), 0.0);
                self.all_candidates.push(candidate);
            }
        }
    }

    fn build_subgraphs(&mut self) -> Result<()> {
        let start = Instant::now();
        let ids: BTreeSet<String> = self
            .lookup
            .values()
            .flat_map(|ids| ids.iter().cloned())
            .collect();
        for id in ids {
            self.subgraphs.get_or_build(self.kb.as_ref(), &id)?;
        }
        self.timings.subgraph_construction = start.elapsed().as_secs_f64();
        Ok(())
    }
}
