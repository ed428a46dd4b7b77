//! Cell–entity annotation
//!
//! Scores each lookup candidate of one cell, folds in the column's CTA
//! through the three-level taxonomy (with adjacency-based promotion), and
//! applies the potential-candidate boost for contextless cells.

use std::collections::HashMap;
use std::time::Instant;

use crate::table::{Candidate, Cell};

use super::{AnnotationEngine, CeaScore, Result};

/// Disambiguation coefficient used when soft scoring is off.
const FIXED_CTA_COEFF: f64 = 0.25;

impl AnnotationEngine {
    /// Annotate the cell at (`row`, `col`). With `only_one`, only the
    /// top-scoring group is kept; otherwise the full sorted candidate list
    /// is returned (used by the intermediate passes). An empty result means
    /// "no annotation"; nothing is partially populated.
    pub fn cea_task(&mut self, col: usize, row: usize, only_one: bool) -> Result<Vec<CeaScore>> {
        let start = Instant::now();
        let result = self.cea_inner(col, row, only_one)?;
        self.timings.cea_task += start.elapsed().as_secs_f64();
        Ok(result)
    }

    fn cea_inner(&mut self, col: usize, row: usize, only_one: bool) -> Result<Vec<CeaScore>> {
        let cell = Cell::new(row, col);
        let Some(ids) = self.lookup.get(&cell).cloned() else {
            return Ok(Vec::new());
        };

        let mut cea_candidates: Vec<CeaScore> = ids
            .iter()
            .filter_map(|id| {
                let candidate = Candidate::new(row, col, id.clone());
                self.scores.get(&candidate).map(|score| CeaScore {
                    id: id.clone(),
                    score: *score,
                })
            })
            .collect();
        if cea_candidates.is_empty() {
            return Ok(Vec::new());
        }

        // CTA disambiguation for this column
        let ctas = self.cta_annot.get(&col).cloned().unwrap_or_default();
        let cta_applied = !ctas.is_empty();
        let mut cta_bonus: HashMap<String, f64> = HashMap::new();
        let mut cta_weights: Vec<f64> = Vec::new();

        if cta_applied {
            for cta in &ctas {
                self.ensure_type_graph(&cta.id)?;
                cta_weights.push(cta.coverage);
            }
            for cea in &cea_candidates {
                self.ensure_candidate_types(&cea.id)?;
            }

            let weights = self.config.cta_taxonomy_weights;
            for cta in &ctas {
                let adjacency = &self.type_graph[&cta.id];
                for cea in &cea_candidates {
                    let types = &self.type_cache[&cea.id];
                    let bonus = if types.level_1.contains_key(&cta.id) {
                        weights[0] * cta.score
                    } else if types.level_2.contains_key(&cta.id)
                        || types.level_1.keys().any(|t| adjacency.contains(t))
                    {
                        weights[1] * cta.score
                    } else if types.level_3.contains_key(&cta.id)
                        || types.level_2.keys().any(|t| adjacency.contains(t))
                    {
                        weights[2] * cta.score
                    } else {
                        0.0
                    };
                    let entry = cta_bonus.entry(cea.id.clone()).or_insert(0.0);
                    *entry = entry.max(bonus);
                }
            }
        }

        if cta_applied {
            let cta_coeff = if self.config.soft_scoring {
                if self.contextless_cells.contains(&cell) {
                    // a candidate carrying one of the accepted CPAs in its
                    // own predicate set gets lifted before the CTA fold
                    for cea in &mut cea_candidates {
                        let candidate = Candidate::new(row, col, cea.id.clone());
                        if let Some(potentials) = self.potential_candidates.get(&candidate) {
                            let cpa_coeff = potentials
                                .iter()
                                .map(|p| p.coverage)
                                .fold(0.0f64, f64::max);
                            cea.score = (cea.score * (1.0 + cpa_coeff)).min(1.0);
                        }
                    }
                    mean(&cta_weights)
                } else {
                    mean(&cta_weights) / 2.0
                }
            } else {
                FIXED_CTA_COEFF
            };

            for cea in &mut cea_candidates {
                let bonus = cta_bonus.get(&cea.id).copied().unwrap_or(0.0);
                cea.score = (cea.score + cta_coeff * bonus) / (1.0 + cta_coeff);
            }
        }

        // order by score, then by how many accepted CPAs the candidate carries
        let potential_count = |id: &str| {
            self.potential_candidates
                .get(&Candidate::new(row, col, id.to_string()))
                .map_or(0, |p| p.len())
        };
        cea_candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| potential_count(&b.id).cmp(&potential_count(&a.id)))
        });

        let result: Vec<CeaScore> = if only_one {
            let top = cea_candidates[0].score;
            cea_candidates
                .into_iter()
                .filter(|c| c.score == top)
                .collect()
        } else {
            cea_candidates
        };
        self.cea_annot.insert(cell, result.clone());
        Ok(result)
    }

    pub(crate) fn ensure_type_graph(&mut self, type_id: &str) -> Result<()> {
        if !self.type_graph.contains_key(type_id) {
            let adjacency = self.kb.type_adjacency(type_id)?;
            self.type_graph.insert(type_id.to_string(), adjacency);
        }
        Ok(())
    }

    pub(crate) fn ensure_candidate_types(&mut self, entity_id: &str) -> Result<()> {
        if !self.type_cache.contains_key(entity_id) {
            let types = self.kb.types_of(entity_id, 3)?;
            self.type_cache.insert(entity_id.to_string(), types);
        }
        Ok(())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
