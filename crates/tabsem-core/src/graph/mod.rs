//! One-hop entity subgraphs
//!
//! For every candidate id the engine materializes the entity's one-hop
//! neighborhood once, split into entity neighbors and literal neighbors,
//! plus the set of distinct directed predicates. Subgraphs are keyed by id
//! only (row/column-independent) and cached for the life of the engine;
//! `BTreeMap` layout keeps them byte-identical across runs for a fixed KB
//! snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::kb::{is_rank_tag, Adjacency, KnowledgeBase, PredicateObjects, Result, INVERSE_PREFIX};

/// Entities with more edges than this are flagged popular; the pair
/// negative cache only applies to popular endpoints to bound memory.
pub const POPULARITY_THRESHOLD: u64 = 1_000_000;

// ============================================================================
// EDGES
// ============================================================================

/// A predicate with a traversal direction. Forward is the stored direction;
/// inverse edges come from `(-)`-prefixed predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectedPredicate {
    pub pid: String,
    pub inverse: bool,
}

impl DirectedPredicate {
    pub fn forward(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            inverse: false,
        }
    }

    pub fn backward(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            inverse: true,
        }
    }

    /// Parse a stored predicate key, honoring the `(-)` prefix.
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix(INVERSE_PREFIX) {
            Some(pid) => Self::backward(pid),
            None => Self::forward(key),
        }
    }

    /// Same predicate traversed the other way.
    pub fn reversed(&self) -> Self {
        Self {
            pid: self.pid.clone(),
            inverse: !self.inverse,
        }
    }
}

impl std::fmt::Display for DirectedPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.inverse {
            write!(f, "{INVERSE_PREFIX}{}", self.pid)
        } else {
            write!(f, "{}", self.pid)
        }
    }
}

/// Literal-type tag attached to a literal edge, parsed from the stored
/// object tag ("DateTime-Gregorian", "DateTime-Period", "String",
/// "Quantity-Q11573", "Quantity-1").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// A single point in time.
    DateTime,
    /// A "start:end" time span.
    DateTimePeriod,
    /// Free text.
    Text,
    /// A quantity; `unit` is the unit-entity id, `None` for dimensionless.
    Quantity { unit: Option<String> },
    /// Unrecognized tag, kept verbatim for forward compatibility.
    Other(String),
}

impl LiteralKind {
    pub fn parse(tag: &str) -> Self {
        let (family, detail) = match tag.split_once('-') {
            Some((f, d)) => (f, Some(d)),
            None => (tag, None),
        };
        match family {
            "DateTime" => {
                if detail == Some("Period") {
                    LiteralKind::DateTimePeriod
                } else {
                    LiteralKind::DateTime
                }
            }
            "String" => LiteralKind::Text,
            "Quantity" => {
                let unit = detail.filter(|d| *d != "1").map(|d| {
                    // unit ids may arrive as full entity URIs
                    d.rsplit('/').next().unwrap_or(d).to_string()
                });
                LiteralKind::Quantity { unit }
            }
            _ => LiteralKind::Other(tag.to_string()),
        }
    }
}

/// What an edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeInfo {
    Entity,
    Literal(LiteralKind),
}

/// One edge of a subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub predicate: DirectedPredicate,
    pub info: EdgeInfo,
}

// ============================================================================
// SUBGRAPH
// ============================================================================

/// One-hop neighborhood of an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    /// Entity neighbor → edges leading to it (either direction).
    pub entity_neighbors: BTreeMap<String, Vec<Edge>>,
    /// Literal value → edges carrying it (forward only).
    pub literal_neighbors: BTreeMap<String, Vec<Edge>>,
    /// All distinct directed predicates seen.
    pub predicates: BTreeSet<DirectedPredicate>,
    /// Total edge count of the entity, the popularity signal.
    pub num_edges: u64,
}

impl Subgraph {
    /// Build from a decoded adjacency.
    pub fn from_adjacency(adjacency: &Adjacency) -> Self {
        let mut subgraph = Subgraph::default();
        for (key, objects) in adjacency {
            let predicate = DirectedPredicate::parse(key);
            subgraph.predicates.insert(predicate.clone());
            subgraph.num_edges += objects.len() as u64;
            match objects {
                PredicateObjects::Backward(subjects) => {
                    for subject in subjects {
                        subgraph
                            .entity_neighbors
                            .entry(subject.clone())
                            .or_default()
                            .push(Edge {
                                predicate: predicate.clone(),
                                info: EdgeInfo::Entity,
                            });
                    }
                }
                PredicateObjects::Forward(objects) => {
                    for (object, tag) in objects {
                        if is_rank_tag(tag) {
                            subgraph
                                .entity_neighbors
                                .entry(object.clone())
                                .or_default()
                                .push(Edge {
                                    predicate: predicate.clone(),
                                    info: EdgeInfo::Entity,
                                });
                        } else {
                            subgraph
                                .literal_neighbors
                                .entry(object.clone())
                                .or_default()
                                .push(Edge {
                                    predicate: predicate.clone(),
                                    info: EdgeInfo::Literal(LiteralKind::parse(tag)),
                                });
                        }
                    }
                }
            }
        }
        subgraph
    }

    pub fn is_popular(&self) -> bool {
        self.num_edges > POPULARITY_THRESHOLD
    }

    /// Whether the subgraph carries a predicate, in the given direction.
    pub fn has_predicate(&self, predicate: &DirectedPredicate) -> bool {
        self.predicates.contains(predicate)
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Engine-owned subgraph cache, keyed by entity id.
#[derive(Default)]
pub struct SubgraphCache {
    graphs: HashMap<String, Subgraph>,
    popular: HashSet<String>,
}

impl SubgraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the cached subgraph, building it from the KB on first use.
    pub fn get_or_build(
        &mut self,
        kb: &dyn KnowledgeBase,
        entity_id: &str,
    ) -> Result<&Subgraph> {
        if !self.graphs.contains_key(entity_id) {
            let adjacency = kb.adjacency(entity_id)?;
            let subgraph = Subgraph::from_adjacency(&adjacency);
            if subgraph.is_popular() {
                self.popular.insert(entity_id.to_string());
            }
            self.graphs.insert(entity_id.to_string(), subgraph);
        }
        Ok(&self.graphs[entity_id])
    }

    /// Already-built subgraph, if any.
    pub fn get(&self, entity_id: &str) -> Option<&Subgraph> {
        self.graphs.get(entity_id)
    }

    /// Whether a built entity crossed the popularity threshold.
    pub fn is_popular(&self, entity_id: &str) -> bool {
        self.popular.contains(entity_id)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
