//! Context reweighting
//!
//! After the first CPA round, each context's weight is tied to how well its
//! column pair annotates: coverage × semantic proximity × a falloff with
//! the distance to the leftmost entity column. The literal-only mode runs
//! at the end of the pipeline and binds every literal column to its single
//! best entity column, marking the other pairs unrelated.

use crate::table::ColumnPair;

use super::AnnotationEngine;

/// Weight floors keep a context from vanishing entirely.
const SEMANTIC_WEIGHT_FLOOR: f64 = 0.05;
const LITERAL_WEIGHT_FLOOR: f64 = 0.01;

impl AnnotationEngine {
    /// Update per-context weights from the current CPA annotations.
    ///
    /// With `literal_only`, instead assign each literal column to its
    /// highest-coverage entity column and mark all other (entity, literal)
    /// pairs unrelated; a literal column rarely relates to more than one
    /// entity column.
    pub fn update_context_weights(&mut self, literal_only: bool) {
        if !literal_only {
            self.reweight_from_cpa();
        } else {
            self.bind_literal_columns();
        }
    }

    fn reweight_from_cpa(&mut self) {
        let Some(&leftmost_entity) = self.entity_cols.iter().min() else {
            return;
        };
        let semantic_weight = self.config.semantic_context_weight;
        let literal_weight = self.config.literal_context_weight;

        let candidates = self.all_candidates.clone();
        for candidate in candidates {
            let cols: Vec<usize> = self
                .context_scores
                .get(&candidate)
                .map(|records| records.keys().copied().collect())
                .unwrap_or_default();
            for col_idx in cols {
                let pair = self.orient_pair(candidate.col, col_idx);
                let is_semantic = self.is_entity_col(col_idx);
                let (base, floor) = if is_semantic {
                    (semantic_weight, SEMANTIC_WEIGHT_FLOOR)
                } else {
                    (literal_weight, LITERAL_WEIGHT_FLOOR)
                };

                let weight = match self.cpa_annot.get(&pair).and_then(|cpas| cpas.first()) {
                    Some(top) => {
                        let coverage = top.coverage;
                        let proximity = top.semantic_proximity;
                        let distance = col_idx
                            .abs_diff(leftmost_entity)
                            .min(candidate.col.abs_diff(leftmost_entity));
                        let falloff = 1.0 / (1.0 + 4.0 * distance as f64);
                        (base * coverage * proximity * falloff).max(floor)
                    }
                    None => floor,
                };

                if let Some(record) = self
                    .context_scores
                    .get_mut(&candidate)
                    .and_then(|records| records.get_mut(&col_idx))
                {
                    record.weight = weight;
                }
            }
        }
    }

    fn bind_literal_columns(&mut self) {
        let entity_cols = self.entity_cols.clone();
        let literal_cols = self.literal_cols.clone();

        for &literal_col in &literal_cols {
            let mut best_coverage = 0.0f64;
            let mut best_entity: Option<usize> = None;
            for &entity_col in &entity_cols {
                let pair = ColumnPair::new(entity_col, literal_col);
                // related pairs are removed again below
                self.unrelated_col_pairs.insert(pair);
                if let Some(top) = self.cpa_annot.get(&pair).and_then(|cpas| cpas.first()) {
                    if top.coverage > best_coverage {
                        best_coverage = top.coverage;
                        best_entity = Some(entity_col);
                    }
                }
            }
            if let Some(entity_col) = best_entity {
                self.unrelated_col_pairs
                    .remove(&ColumnPair::new(entity_col, literal_col));
            }
        }
    }
}
