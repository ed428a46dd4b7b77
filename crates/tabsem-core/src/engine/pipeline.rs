//! Four-pass pipeline driver
//!
//! The fixed-point schedule over the scoring kernel and the three tasks:
//!
//! 1. initialize scores (similarity + context, caches populated)
//! 2. enumerative ranking: CEA and CPA with full candidate lists
//! 3. reweight contexts from the CPAs, rescore, rank again, add CTA
//! 4. disambiguate CEA/CTA, refresh CPA
//! 5. reinforced disambiguation: bind literal columns, rescore with
//!    contextless tracking, final CEA/CTA/CPA
//!
//! Results are deterministic for a fixed KB snapshot: iteration is in
//! ascending row/column order and every tie-break is specified.

use std::sync::Arc;

use crate::annotation::{
    entity_label, relation_label_and_uri, round2, AnnotatedTable, AnnotationOutput, CeaEntry,
    CpaEntry, CtaEntry, EntityAnnotation, RawEcho, RelationAnnotation, TimingBreakdown,
    TypeAnnotation,
};
use crate::config::AnnotationConfig;
use crate::kb::KnowledgeBase;
use crate::table::{EntityLookup, PreprocessedTable};

use super::{AnnotationEngine, EngineError, Result};

impl AnnotationEngine {
    /// Run the full annotation schedule. After this, `cea_annot`,
    /// `cta_annot` and `cpa_annot` hold the final disambiguated results.
    pub fn annotate(&mut self) -> Result<()> {
        // Pass 0+1: initial scores, enumerative CEA/CPA
        tracing::debug!("pass 1: enumerative ranking");
        self.entity_scoring_task(true, false)?;
        self.run_cea(false)?;
        self.run_cpa(false)?;

        // Pass 2: CPA-driven reweighting, rescore, rank again
        tracing::debug!("pass 2: reweight and rescore");
        self.update_context_weights(false);
        self.entity_scoring_task(false, false)?;
        self.cea_annot.clear();
        self.run_cea(false)?;
        self.run_cta(false)?;

        // Pass 3: CEA+CTA disambiguation, CPA refresh
        tracing::debug!("pass 3: disambiguation");
        self.cea_annot.clear();
        self.run_cea(true)?;
        self.cta_annot.clear();
        self.run_cta(true)?;
        self.cpa_annot.clear();
        self.run_cpa(false)?;

        // Pass 4: reinforced disambiguation
        tracing::debug!("pass 4: reinforced disambiguation");
        self.update_context_weights(true);
        self.entity_scoring_task(false, true)?;
        self.cea_annot.clear();
        self.run_cea(true)?;
        self.cta_annot.clear();
        self.run_cta(true)?;
        self.cpa_annot.clear();
        self.run_cpa(true)?;

        tracing::info!(
            cea = self.cea_annot.len(),
            cta = self.cta_annot.len(),
            cpa = self.cpa_annot.len(),
            subgraphs = self.subgraphs.len(),
            "annotation finished"
        );
        Ok(())
    }

    fn run_cea(&mut self, only_one: bool) -> Result<()> {
        let entity_cols = self.entity_cols.clone();
        for col in entity_cols {
            for row in self.first_data_row..self.num_rows {
                self.cea_task(col, row, only_one)?;
            }
        }
        Ok(())
    }

    fn run_cta(&mut self, only_one: bool) -> Result<()> {
        let entity_cols = self.entity_cols.clone();
        for col in entity_cols {
            self.cta_task(col, only_one)?;
        }
        Ok(())
    }

    fn run_cpa(&mut self, only_one: bool) -> Result<()> {
        let entity_cols = self.entity_cols.clone();
        let literal_cols = self.literal_cols.clone();
        for i in 0..entity_cols.len().saturating_sub(1) {
            for j in i + 1..entity_cols.len() {
                self.cpa_task(entity_cols[i], entity_cols[j], only_one)?;
            }
        }
        for &head in &entity_cols {
            for &tail in &literal_cols {
                self.cpa_task(head, tail, only_one)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // OUTPUT ASSEMBLY
    // ------------------------------------------------------------------------

    /// Render the final annotations into the output document.
    pub fn build_output(&self, raw_table: Vec<Vec<String>>) -> AnnotationOutput {
        let kb = self.kb.as_ref();

        let cea = self
            .cea_annot
            .iter()
            .filter_map(|(cell, ceas)| {
                let best = ceas.first()?;
                Some(CeaEntry {
                    row: cell.row,
                    column: cell.col,
                    annotation: EntityAnnotation {
                        label: entity_label(kb, &best.id),
                        uri: kb.uri(&best.id),
                        score: round2(best.score),
                    },
                })
            })
            .collect();

        let cta = self
            .cta_annot
            .iter()
            .filter(|(_, ctas)| !ctas.is_empty())
            .map(|(col, ctas)| CtaEntry {
                column: *col,
                annotation: ctas
                    .iter()
                    .map(|cta| TypeAnnotation {
                        label: entity_label(kb, &cta.id),
                        uri: kb.uri(&cta.id),
                        score: round2(cta.score),
                        coverage: round2(cta.coverage),
                    })
                    .collect(),
            })
            .collect();

        let cpa = self
            .cpa_annot
            .iter()
            .filter_map(|(pair, cpas)| {
                let best = cpas.first()?;
                let (label, uri) = relation_label_and_uri(kb, &best.expr);
                Some(CpaEntry {
                    head_column: pair.head,
                    tail_column: pair.tail,
                    annotation: RelationAnnotation {
                        label,
                        uri,
                        score: round2(best.score),
                        coverage: round2(best.coverage),
                    },
                })
            })
            .collect();

        AnnotationOutput {
            raw: RawEcho {
                table_data_raw: raw_table,
            },
            annotated: Some(AnnotatedTable {
                table_data_revised: self.table.clone(),
                cea,
                cta,
                cpa,
            }),
            timings: TimingBreakdown {
                preprocessing_time: 0.0,
                lookup_time: self.timings.lookup,
                entity_scoring_time: self.timings.entity_scoring,
                subgraph_construction_time: self.timings.subgraph_construction,
                cea_task_time: self.timings.cea_task,
                cta_task_time: self.timings.cta_task,
                cpa_task_time: self.timings.cpa_task,
            },
            avg_lookup_candidate: self.avg_lookup_candidate,
            abnormal_mentions: self.abnormal_mentions.clone(),
        }
    }
}

// ============================================================================
// TOP-LEVEL ENTRY POINT
// ============================================================================

/// Annotate one table end to end.
///
/// Preprocessing and lookup failures are not errors: the output then
/// carries only the raw-table echo (and any abnormal mentions). KB store
/// I/O errors surface as `Err`.
pub fn annotate_table(
    kb: Arc<dyn KnowledgeBase>,
    raw_table: Vec<Vec<String>>,
    preprocessed: PreprocessedTable,
    lookup: &dyn EntityLookup,
    lookup_index: &str,
    config: AnnotationConfig,
) -> Result<AnnotationOutput> {
    match AnnotationEngine::new(kb, preprocessed, lookup, lookup_index, config) {
        Ok(mut engine) => {
            engine.annotate()?;
            Ok(engine.build_output(raw_table))
        }
        Err(EngineError::Preprocessing) => {
            tracing::warn!("table preprocessing unusable, returning raw echo");
            Ok(echo_only(raw_table, Vec::new()))
        }
        Err(EngineError::Lookup { abnormal_mentions }) => {
            tracing::warn!("entity lookup empty, returning raw echo");
            Ok(echo_only(raw_table, abnormal_mentions))
        }
        Err(err) => Err(err),
    }
}

fn echo_only(raw_table: Vec<Vec<String>>, abnormal_mentions: Vec<String>) -> AnnotationOutput {
    AnnotationOutput {
        raw: RawEcho {
            table_data_raw: raw_table,
        },
        annotated: None,
        abnormal_mentions,
        ..Default::default()
    }
}
