//! Column–type annotation
//!
//! Aggregates the hierarchical types of every CEA in the column, weighted
//! by taxonomy level and CEA score, and keeps the best-covered types. In
//! final mode the direct supertypes of the winners ride along as secondary
//! annotations.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::table::Cell;

use super::{AnnotationEngine, CtaScore, Result};

#[derive(Debug, Clone, Copy, Default)]
struct TypeStats {
    count: usize,
    total_score: f64,
    total_rank: u64,
}

impl TypeStats {
    fn product(&self) -> f64 {
        self.count as f64 * self.total_score
    }
}

impl AnnotationEngine {
    /// Annotate the types of one column. With `only_one`, the types at the
    /// top combined score (plus their direct supertypes) are returned;
    /// otherwise every type matching the top coverage. Empty means "no
    /// annotation".
    pub fn cta_task(&mut self, col: usize, only_one: bool) -> Result<Vec<CtaScore>> {
        let start = Instant::now();
        let result = self.cta_inner(col, only_one)?;
        self.timings.cta_task += start.elapsed().as_secs_f64();
        Ok(result)
    }

    fn cta_inner(&mut self, col: usize, only_one: bool) -> Result<Vec<CtaScore>> {
        let weights = self.config.cta_taxonomy_weights;
        let mut candidate_types: BTreeMap<String, TypeStats> = BTreeMap::new();

        for row in self.first_data_row..self.num_rows {
            let cell = Cell::new(row, col);
            let Some(ceas) = self.cea_annot.get(&cell).cloned() else {
                continue;
            };

            // best (score, rank) per type within this row
            let mut row_types: BTreeMap<String, (f64, u8)> = BTreeMap::new();
            for cea in &ceas {
                self.ensure_candidate_types(&cea.id)?;
                let types = self.type_cache[&cea.id].clone();
                for (level_map, level_weight) in [
                    (&types.level_1, weights[0]),
                    (&types.level_2, weights[1]),
                    (&types.level_3, weights[2]),
                ] {
                    for (type_id, rank_tag) in level_map {
                        let rank = self.kb.rank_weight(rank_tag);
                        let score = level_weight * cea.score;
                        let entry = row_types.entry(type_id.clone()).or_insert((0.0, 0));
                        entry.0 = entry.0.max(score);
                        entry.1 = entry.1.max(rank);
                    }
                }
            }

            for (type_id, (score, rank)) in row_types {
                let stats = candidate_types.entry(type_id).or_default();
                stats.count += 1;
                stats.total_score += score;
                stats.total_rank += rank as u64;
            }
        }

        if candidate_types.is_empty() {
            return Ok(Vec::new());
        }

        let mut sorted: Vec<(String, TypeStats)> = candidate_types.into_iter().collect();
        sorted.sort_by(|a, b| {
            b.1.product()
                .partial_cmp(&a.1.product())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.total_rank.cmp(&a.1.total_rank))
        });

        let num_data_rows = self.num_data_rows() as f64;
        let top = sorted[0].1;
        let mut result: Vec<CtaScore> = Vec::new();

        if only_one {
            let mut supertypes: BTreeSet<String> = BTreeSet::new();
            for (type_id, stats) in &sorted {
                if stats.product() == top.product() {
                    result.push(CtaScore {
                        id: type_id.clone(),
                        score: stats.total_score / num_data_rows,
                        coverage: stats.count as f64 / num_data_rows,
                    });
                    supertypes.extend(self.kb.supertypes_of(type_id)?);
                }
            }
            // supertypes of the winners ride along as secondaries
            for (type_id, stats) in &sorted {
                if supertypes.contains(type_id) && !result.iter().any(|r| r.id == *type_id) {
                    result.push(CtaScore {
                        id: type_id.clone(),
                        score: stats.total_score / num_data_rows,
                        coverage: stats.count as f64 / num_data_rows,
                    });
                }
            }
        } else {
            for (type_id, stats) in &sorted {
                if stats.count >= top.count {
                    result.push(CtaScore {
                        id: type_id.clone(),
                        score: stats.total_score / num_data_rows,
                        coverage: stats.count as f64 / num_data_rows,
                    });
                }
            }
        }

        self.cta_annot.insert(col, result.clone());
        Ok(result)
    }
}
