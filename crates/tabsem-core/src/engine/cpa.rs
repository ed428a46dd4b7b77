//! Column-pair annotation
//!
//! Collects the cached relation candidates between the CEAs of the head
//! column and the CEAs (or literal cell texts) of the tail column, row by
//! row, and keeps the best-supported relation. Ties prefer frequent,
//! high-proximity, single-predicate, forward relations, in that order.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::annotation::RelationExpr;
use crate::table::{Cell, ColumnPair};

use super::{AnnotationEngine, CeaScore, CpaScore, Result};

#[derive(Debug, Clone, Copy)]
struct RelationStats {
    count: usize,
    total_score: f64,
    semantic_proximity: f64,
}

impl RelationStats {
    fn product(&self) -> f64 {
        self.count as f64 * self.total_score
    }
}

impl AnnotationEngine {
    /// Annotate the relation of the ordered pair (`head_col`, `tail_col`).
    /// Unrelated pairs and literal tails left of the head are skipped.
    /// Empty means "no annotation".
    pub fn cpa_task(
        &mut self,
        head_col: usize,
        tail_col: usize,
        only_one: bool,
    ) -> Result<Vec<CpaScore>> {
        let start = Instant::now();
        let result = self.cpa_inner(head_col, tail_col, only_one);
        self.timings.cpa_task += start.elapsed().as_secs_f64();
        Ok(result)
    }

    fn cpa_inner(&mut self, head_col: usize, tail_col: usize, only_one: bool) -> Vec<CpaScore> {
        let pair = ColumnPair::new(head_col, tail_col);
        let tail_is_literal = !self.is_entity_col(tail_col);
        if self.unrelated_col_pairs.contains(&pair) || (tail_is_literal && tail_col < head_col) {
            return Vec::new();
        }

        let mut aggregated: BTreeMap<RelationExpr, RelationStats> = BTreeMap::new();
        for row in self.first_data_row..self.num_rows {
            let Some(heads) = self.cea_annot.get(&Cell::new(row, head_col)) else {
                continue;
            };
            let tails: Vec<CeaScore> = if tail_is_literal {
                // literal tails contribute the cell text itself
                vec![CeaScore {
                    id: self.table[row][tail_col].clone(),
                    score: 0.0,
                }]
            } else {
                match self.cea_annot.get(&Cell::new(row, tail_col)) {
                    Some(tails) => tails.clone(),
                    None => continue,
                }
            };

            // merge relations within the row: max score, min proximity
            let mut row_relations: BTreeMap<RelationExpr, (f64, f64)> = BTreeMap::new();
            for head in heads {
                for tail in &tails {
                    let key = (head.id.clone(), tail.id.clone());
                    let Some(relations) = self.relation_cache.get(&key) else {
                        continue;
                    };
                    for relation in relations {
                        let score = relation.semantic_proximity * head.score.max(tail.score);
                        let entry = row_relations
                            .entry(relation.expr.clone())
                            .or_insert((score, relation.semantic_proximity));
                        entry.0 = entry.0.max(score);
                        entry.1 = entry.1.min(relation.semantic_proximity);
                    }
                }
            }

            for (expr, (score, proximity)) in row_relations {
                aggregated
                    .entry(expr)
                    .and_modify(|stats| {
                        stats.count += 1;
                        stats.total_score += score;
                        stats.semantic_proximity = stats.semantic_proximity.min(proximity);
                    })
                    .or_insert(RelationStats {
                        count: 1,
                        total_score: score,
                        semantic_proximity: proximity,
                    });
            }
        }

        if aggregated.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<(RelationExpr, RelationStats)> = aggregated.into_iter().collect();
        sorted.sort_by(|a, b| {
            b.1.product()
                .partial_cmp(&a.1.product())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.count.cmp(&a.1.count))
                .then_with(|| {
                    b.1.semantic_proximity
                        .partial_cmp(&a.1.semantic_proximity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                // single predicates beat paths, forward beats backward
                .then_with(|| a.0.is_path().cmp(&b.0.is_path()))
                .then_with(|| a.0.has_inverse().cmp(&b.0.has_inverse()))
        });

        let num_data_rows = self.num_data_rows() as f64;
        let top = sorted[0].1;
        let keep = |stats: &RelationStats| {
            if only_one {
                stats.product() >= top.product()
            } else {
                stats.count >= top.count
            }
        };

        let result: Vec<CpaScore> = sorted
            .iter()
            .filter(|(_, stats)| keep(stats))
            .map(|(expr, stats)| CpaScore {
                expr: expr.clone(),
                score: stats.total_score / num_data_rows,
                coverage: stats.count as f64 / num_data_rows,
                semantic_proximity: stats.semantic_proximity,
            })
            .collect();

        self.cpa_annot.insert(pair, result.clone());
        result
    }
}
