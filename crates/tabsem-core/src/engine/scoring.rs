//! Candidate scoring
//!
//! Three layers feed each candidate's score:
//! - literal similarity of the mention to the entity's labels/aliases
//! - semantic context: pairwise subgraph intersection against the other
//!   entity columns of the row
//! - literal context: the candidate's literal edges against the row's
//!   date / text / quantity cells
//!
//! The final score combines the CPA-gated weighted context with a sigmoid
//! over the literal similarity, so high similarity only wins when context
//! backs it.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::annotation::RelationExpr;
use crate::graph::{DirectedPredicate, EdgeInfo, LiteralKind};
use crate::scoring::{
    blended_similarity, dates_equal, magnitude_similarity, period_matches, years_equal,
    CURRENCY_BASE,
};
use crate::table::{Candidate, Cell, ColumnRole};

use super::{AnnotationEngine, ContextRecord, RelationCandidate, Result};

/// Sub-scores never drop below this floor.
pub(crate) const CONTEXT_FLOOR: f64 = 0.1;

/// Mixed-direction two-hop paths are penalized by this factor.
const MIXED_DIRECTION_PENALTY: f64 = 1.75;

/// Literal text edges must clear this similarity to count as context.
const TEXT_CONTEXT_THRESHOLD: f64 = 0.9;

/// Quantity match thresholds; currency drifts over time so it gets the
/// looser band.
const QUANTITY_THRESHOLD: f64 = 0.95;
const CURRENCY_QUANTITY_THRESHOLD: f64 = 0.75;

struct LiteralMatch {
    col: usize,
    mention: String,
    score: f64,
    predicate: DirectedPredicate,
}

impl AnnotationEngine {
    // ------------------------------------------------------------------------
    // LITERAL SIMILARITY
    // ------------------------------------------------------------------------

    /// Fill the mention/label similarity for every candidate. Scores the
    /// lookup service already computed are reused; the rest fall back to a
    /// label/alias blend with aliases discounted to 0.9.
    pub(crate) fn literal_similarity_scoring(&mut self) -> Result<()> {
        let candidates = self.all_candidates.clone();
        for candidate in candidates {
            let sim = match self.lookup_scores.get(&candidate).copied().flatten() {
                Some(score) => score.clamp(0.0, 1.0),
                None => {
                    let mention = &self.table[candidate.row][candidate.col];
                    let labels = self.kb.labels(&candidate.id)?;
                    let label_sim = labels
                        .label
                        .as_deref()
                        .map(|l| blended_similarity(mention, l))
                        .unwrap_or(0.0);
                    let alias_sim = labels
                        .aliases
                        .iter()
                        .map(|a| blended_similarity(mention, a))
                        .fold(0.0f64, f64::max);
                    label_sim.max(0.9 * alias_sim)
                }
            };
            self.sim_scores.insert(candidate, sim);
        }
        // the raw lookup scores are not needed past this point
        self.lookup_scores.clear();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // PAIR RELATIONS
    // ------------------------------------------------------------------------

    /// Relations between two candidate ids with their semantic proximities,
    /// plus the best proximity found. Direct edges score 1.0; two-hop paths
    /// through a shared neighbor score by the neighbor's (inverse log)
    /// popularity, halved for mixed-direction hops; paths collapsing over a
    /// transitive predicate keep 1.0. Cached pairs are replayed; popular
    /// pairs with no overlap go to the negative cache.
    fn pair_relations(
        &mut self,
        head_id: &str,
        tail_id: &str,
    ) -> Result<(BTreeMap<RelationExpr, f64>, f64)> {
        let key = (head_id.to_string(), tail_id.to_string());
        if let Some(cached) = self.relation_cache.get(&key) {
            let mut relations = BTreeMap::new();
            let mut best = 0.0f64;
            for rel in cached {
                best = best.max(rel.semantic_proximity);
                relations.insert(rel.expr.clone(), rel.semantic_proximity);
            }
            return Ok((relations, best));
        }

        let mut relations: BTreeMap<RelationExpr, f64> = BTreeMap::new();
        let mut best = 0.0f64;
        let Some(head_sg) = self.subgraphs.get(head_id) else {
            return Ok((relations, best));
        };

        if let Some(edges) = head_sg.entity_neighbors.get(tail_id) {
            // directly connected
            best = 1.0;
            for edge in edges {
                relations.insert(RelationExpr::single(edge.predicate.clone()), 1.0);
            }
            return Ok((relations, best));
        }

        if !self.config.multi_hop_context || self.negative_pairs.contains(&key) {
            return Ok((relations, best));
        }
        let Some(tail_sg) = self.subgraphs.get(tail_id) else {
            return Ok((relations, best));
        };

        let shared: Vec<&String> = head_sg
            .entity_neighbors
            .keys()
            .filter(|node| tail_sg.entity_neighbors.contains_key(*node))
            .collect();
        if shared.is_empty() {
            if self.subgraphs.is_popular(head_id) && self.subgraphs.is_popular(tail_id) {
                self.negative_pairs.insert(key);
            }
            return Ok((relations, best));
        }

        let transitive = self.kb.transitive_predicates();
        for node in shared {
            let num_edges = self.kb.num_incoming_edges(node)?;
            if num_edges == 0 {
                continue;
            }
            let popularity = 1.0 / (2.0 + (2.0 + num_edges as f64).log10());
            for head_edge in &head_sg.entity_neighbors[node] {
                for tail_edge in &tail_sg.entity_neighbors[node] {
                    let reversed_tail = tail_edge.predicate.reversed();
                    let (expr, proximity) = if head_edge.predicate == reversed_tail
                        && transitive.contains(&head_edge.predicate.pid)
                    {
                        (RelationExpr::single(head_edge.predicate.clone()), 1.0)
                    } else {
                        if self.config.transitive_property_only_path {
                            continue;
                        }
                        let mixed = head_edge.predicate.inverse != reversed_tail.inverse;
                        let proximity = if mixed {
                            popularity / MIXED_DIRECTION_PENALTY
                        } else {
                            popularity
                        };
                        (
                            RelationExpr::Path(head_edge.predicate.clone(), reversed_tail),
                            proximity,
                        )
                    };
                    best = best.max(proximity);
                    relations
                        .entry(expr)
                        .and_modify(|p| *p = p.min(proximity))
                        .or_insert(proximity);
                }
            }
        }
        Ok((relations, best))
    }

    // ------------------------------------------------------------------------
    // CONTEXT SCORING
    // ------------------------------------------------------------------------

    /// Pairwise context over all rows: semantic context between entity
    /// columns, then literal context from each entity column to the literal
    /// columns to its right. Populates the relation caches as a side effect.
    pub(crate) fn context_scoring(&mut self) -> Result<()> {
        for row in self.first_data_row..self.num_rows {
            self.semantic_context_for_row(row)?;
            self.literal_context_for_row(row)?;
        }
        Ok(())
    }

    fn semantic_context_for_row(&mut self, row: usize) -> Result<()> {
        let entity_cols = self.entity_cols.clone();
        let semantic_weight = self.config.semantic_context_weight;

        for i in 0..entity_cols.len().saturating_sub(1) {
            let head_col = entity_cols[i];
            let head_cell = Cell::new(row, head_col);
            let head_mention = self.table[row][head_col].clone();
            let head_ids = self.lookup.get(&head_cell).cloned().unwrap_or_default();

            if head_ids.is_empty() {
                // no head candidates: tail candidates still get a floored
                // record for this column
                for &tail_col in &entity_cols[i + 1..] {
                    let tail_cell = Cell::new(row, tail_col);
                    for tail_id in self.lookup.get(&tail_cell).cloned().unwrap_or_default() {
                        let tail_candidate = Candidate::new(row, tail_col, tail_id);
                        if let Some(records) = self.context_scores.get_mut(&tail_candidate) {
                            records.insert(head_col, ContextRecord::floor(semantic_weight));
                        }
                    }
                }
                continue;
            }

            for head_id in &head_ids {
                let head_candidate = Candidate::new(row, head_col, head_id.clone());
                for &tail_col in &entity_cols[i + 1..] {
                    let tail_cell = Cell::new(row, tail_col);
                    let tail_mention = self.table[row][tail_col].clone();
                    if let Some(records) = self.context_scores.get_mut(&head_candidate) {
                        records.insert(tail_col, ContextRecord::floor(semantic_weight));
                    }

                    for tail_id in self.lookup.get(&tail_cell).cloned().unwrap_or_default() {
                        let tail_candidate = Candidate::new(row, tail_col, tail_id.clone());
                        if let Some(records) = self.context_scores.get_mut(&tail_candidate) {
                            records
                                .entry(head_col)
                                .or_insert_with(|| ContextRecord::floor(semantic_weight));
                        }
                        if *head_id == tail_id {
                            continue;
                        }

                        let (relations, best) = self.pair_relations(head_id, &tail_id)?;
                        if best <= 0.0 {
                            continue;
                        }

                        let head_score =
                            gated_sub_score(best, self.sim(&tail_candidate), &tail_mention);
                        let tail_score =
                            gated_sub_score(best, self.sim(&head_candidate), &head_mention);
                        self.raise_context(&head_candidate, tail_col, head_score);
                        self.raise_context(&tail_candidate, head_col, tail_score);

                        if head_score > CONTEXT_FLOOR || tail_score > CONTEXT_FLOOR {
                            self.relation_cache
                                .entry((head_id.clone(), tail_id.clone()))
                                .or_insert_with(|| {
                                    relations
                                        .iter()
                                        .map(|(expr, proximity)| RelationCandidate {
                                            expr: expr.clone(),
                                            semantic_proximity: *proximity,
                                        })
                                        .collect()
                                });
                            for expr in relations.keys() {
                                self.push_evidence(&head_candidate, tail_col, expr);
                                self.push_evidence(&tail_candidate, head_col, expr);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn literal_context_for_row(&mut self, row: usize) -> Result<()> {
        let entity_cols = self.entity_cols.clone();
        let literal_cols = self.literal_cols.clone();
        let literal_weight = self.config.literal_context_weight;

        for &entity_col in &entity_cols {
            let cell = Cell::new(row, entity_col);
            let ids = self.lookup.get(&cell).cloned().unwrap_or_default();
            for entity_id in ids {
                let candidate = Candidate::new(row, entity_col, entity_id.clone());

                // every literal column to the right gets a floored record
                for &literal_col in &literal_cols {
                    if literal_col < entity_col {
                        continue;
                    }
                    if let Some(records) = self.context_scores.get_mut(&candidate) {
                        records.insert(literal_col, ContextRecord::floor(literal_weight));
                    }
                }

                let matches = self.collect_literal_matches(row, entity_col, &entity_id)?;
                for m in matches {
                    self.raise_context(&candidate, m.col, m.score);
                    let expr = RelationExpr::single(m.predicate);
                    self.push_evidence(&candidate, m.col, &expr);
                    // literal relations all carry full proximity
                    let cache = self
                        .relation_cache
                        .entry((entity_id.clone(), m.mention))
                        .or_default();
                    if !cache.iter().any(|r| r.expr == expr) {
                        cache.push(RelationCandidate {
                            expr,
                            semantic_proximity: 1.0,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_literal_matches(
        &self,
        row: usize,
        entity_col: usize,
        entity_id: &str,
    ) -> Result<Vec<LiteralMatch>> {
        let mut matches = Vec::new();
        let Some(subgraph) = self.subgraphs.get(entity_id) else {
            return Ok(matches);
        };

        for &literal_col in &self.literal_cols {
            if literal_col < entity_col {
                continue;
            }
            let role = self.roles[literal_col];
            let mention = &self.table[row][literal_col];
            let cell_quantities = if role == ColumnRole::NumericWithUnit {
                self.units.standardize_text(mention)
            } else {
                BTreeMap::new()
            };

            for (value, edges) in &subgraph.literal_neighbors {
                for edge in edges {
                    let EdgeInfo::Literal(kind) = &edge.info else {
                        continue;
                    };
                    let score = match (kind, role) {
                        (LiteralKind::DateTime, ColumnRole::Date) => {
                            if dates_equal(value, mention) {
                                1.0
                            } else if years_equal(value, mention) {
                                0.8
                            } else {
                                0.0
                            }
                        }
                        (LiteralKind::DateTimePeriod, ColumnRole::Date) => {
                            if period_matches(value, mention) {
                                1.0
                            } else {
                                0.0
                            }
                        }
                        (LiteralKind::Text, ColumnRole::Textual) => {
                            let sim = blended_similarity(value, mention);
                            if sim > TEXT_CONTEXT_THRESHOLD {
                                sim
                            } else {
                                0.0
                            }
                        }
                        (
                            LiteralKind::Quantity { unit: Some(unit) },
                            ColumnRole::NumericWithUnit,
                        ) => self.quantity_match(value, unit, &cell_quantities)?,
                        // dimensionless matching is reserved; plain numeric
                        // columns stay at the floor
                        _ => 0.0,
                    };
                    if score > 0.0 {
                        matches.push(LiteralMatch {
                            col: literal_col,
                            mention: mention.clone(),
                            score,
                            predicate: edge.predicate.clone(),
                        });
                    }
                }
            }
        }
        Ok(matches)
    }

    /// Compare one KB quantity edge against the standardized cell
    /// quantities: same base unit, single magnitude on both sides, within
    /// the dimension's threshold.
    fn quantity_match(
        &self,
        value: &str,
        unit_entity: &str,
        cell_quantities: &BTreeMap<String, Vec<f64>>,
    ) -> Result<f64> {
        if cell_quantities.len() != 1 {
            return Ok(0.0);
        }
        let Some(symbol) = self.kb.unit_symbol(unit_entity)? else {
            return Ok(0.0);
        };
        let Some(kb_quantity) = self.units.standardize_value(value, &symbol) else {
            return Ok(0.0);
        };
        let Some(magnitudes) = cell_quantities.get(&kb_quantity.unit) else {
            return Ok(0.0);
        };
        if magnitudes.len() != 1 {
            return Ok(0.0);
        }
        let sim = magnitude_similarity(kb_quantity.magnitude, magnitudes[0]);
        let threshold = if kb_quantity.unit == CURRENCY_BASE {
            CURRENCY_QUANTITY_THRESHOLD
        } else {
            QUANTITY_THRESHOLD
        };
        Ok(if sim > threshold { sim } else { 0.0 })
    }

    fn sim(&self, candidate: &Candidate) -> f64 {
        self.sim_scores.get(candidate).copied().unwrap_or(0.0)
    }

    fn raise_context(&mut self, candidate: &Candidate, col: usize, score: f64) {
        if let Some(record) = self
            .context_scores
            .get_mut(candidate)
            .and_then(|records| records.get_mut(&col))
        {
            record.score = record.score.max(score);
        }
    }

    fn push_evidence(&mut self, candidate: &Candidate, col: usize, expr: &RelationExpr) {
        if let Some(record) = self
            .context_scores
            .get_mut(candidate)
            .and_then(|records| records.get_mut(&col))
        {
            record.evidence.push(expr.clone());
        }
    }

    // ------------------------------------------------------------------------
    // FINAL CANDIDATE SCORE
    // ------------------------------------------------------------------------

    /// Combine context and similarity into the per-candidate score.
    ///
    /// On the first step this also runs the similarity and context scoring.
    /// On later steps the context sub-score is rescaled by the matching CPA
    /// (coverage × proximity) or collapses to the floor. The last step
    /// additionally records contextless cells and potential CPA-bearing
    /// candidates.
    pub fn entity_scoring_task(&mut self, first_step: bool, last_step: bool) -> Result<()> {
        if first_step {
            let start = Instant::now();
            self.literal_similarity_scoring()?;
            self.context_scoring()?;
            self.timings.entity_scoring = start.elapsed().as_secs_f64();
        }

        let candidates = self.all_candidates.clone();
        let semantic_weight = self.config.semantic_context_weight;
        let literal_weight = self.config.literal_context_weight;
        let has_context_columns = !self.entity_cols.is_empty() || !self.literal_cols.is_empty();
        let mut cells_seen: Vec<Cell> = Vec::new();
        let mut cells_with_context: Vec<Cell> = Vec::new();

        for candidate in candidates {
            let cell = candidate.cell();
            let sim = self.sim(&candidate);

            if self.num_columns <= 1 || !has_context_columns {
                // no context at all: similarity is the score
                self.scores.insert(candidate, sim);
                if last_step {
                    cells_seen.push(cell);
                }
                continue;
            }
            if last_step {
                cells_seen.push(cell);
            }

            let records = self.context_scores.get(&candidate).cloned().unwrap_or_default();
            let mut context_score = 0.0;
            let mut context_weight = 0.0;
            let mut max_context_weight = 0.0f64;

            for (&col_idx, record) in &records {
                let pair = self.orient_pair(candidate.col, col_idx);
                if self.unrelated_col_pairs.contains(&pair) {
                    continue;
                }
                let Some(cpas) = self.cpa_annot.get(&pair) else {
                    continue;
                };

                let scale_factor = if first_step {
                    1.0
                } else {
                    cpas.iter()
                        .find(|cpa| record.evidence.contains(&cpa.expr))
                        .map(|cpa| cpa.coverage * cpa.semantic_proximity)
                        .unwrap_or(0.0)
                };
                let scaled = (scale_factor * record.score).max(CONTEXT_FLOOR);
                context_score += record.weight * scaled;

                if last_step {
                    if scaled > CONTEXT_FLOOR {
                        cells_with_context.push(cell);
                    }
                    self.record_potential_candidates(&candidate, col_idx, &pair);
                }

                max_context_weight = max_context_weight.max(record.weight);
                context_weight += if self.is_entity_col(col_idx) {
                    semantic_weight
                } else {
                    literal_weight
                };
            }

            let context_score = if context_weight > 0.0 {
                context_score / context_weight
            } else {
                0.01
            };

            let score = if max_context_weight > 0.1 {
                // reward high literal similarity only where context backs it
                let gate = 1.0 / (1.0 + (-(sim.powf(2.5) / 0.5 - 1.0) / 0.2).exp());
                context_score * gate
            } else {
                0.1 * sim
            };
            self.scores.insert(candidate, score);
        }

        if last_step {
            let with_context: std::collections::HashSet<Cell> =
                cells_with_context.into_iter().collect();
            for cell in cells_seen {
                if !with_context.contains(&cell) {
                    self.contextless_cells.insert(cell);
                }
            }
        }
        Ok(())
    }

    /// At the last step, remember candidates whose own predicate set
    /// contains an accepted CPA of one of their column pairs.
    fn record_potential_candidates(
        &mut self,
        candidate: &Candidate,
        context_col: usize,
        pair: &crate::table::ColumnPair,
    ) {
        let Some(cpas) = self.cpa_annot.get(pair) else {
            return;
        };
        let Some(subgraph) = self.subgraphs.get(&candidate.id) else {
            return;
        };
        let candidate_is_tail = context_col < candidate.col && self.is_entity_col(context_col);

        let mut found: Vec<super::PotentialCpa> = Vec::new();
        for cpa in cpas {
            // only single-predicate relations can occur in a predicate set
            let RelationExpr::Single(predicate) = &cpa.expr else {
                continue;
            };
            let probe = if candidate_is_tail {
                predicate.reversed()
            } else {
                predicate.clone()
            };
            if subgraph.has_predicate(&probe) {
                found.push(super::PotentialCpa {
                    coverage: cpa.coverage,
                    score: cpa.score,
                    expr: cpa.expr.clone(),
                });
            }
        }
        if !found.is_empty() {
            self.potential_candidates
                .entry(candidate.clone())
                .or_default()
                .extend(found);
        }
    }
}

/// Partner-similarity gate: long partner mentions are allowed a looser
/// similarity threshold; below the gate the sub-score stays at the floor.
fn gated_sub_score(best_proximity: f64, partner_sim: f64, partner_mention: &str) -> f64 {
    let threshold = if partner_mention.chars().count() > 5 {
        0.7
    } else {
        0.9
    };
    if partner_sim >= threshold {
        (best_proximity * partner_sim).max(CONTEXT_FLOOR)
    } else {
        CONTEXT_FLOOR
    }
}

// ============================================================================
// TESTS
// ============================================================================
