//! Relation expressions
//!
//! A column-pair relation is either a single directed predicate or a
//! length-two predicate path through a shared neighbor, rendered as
//! `p1::p2` with `(-)` marking backward traversal. A path whose two hops
//! are the same transitive predicate collapses to that predicate.

use std::collections::BTreeSet;

use crate::graph::DirectedPredicate;

/// A relation candidate expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationExpr {
    /// Direct edge between the two columns' entities.
    Single(DirectedPredicate),
    /// Two-hop path via a shared neighbor: head-side hop, then the
    /// direction-reversed tail-side hop.
    Path(DirectedPredicate, DirectedPredicate),
}

impl RelationExpr {
    pub fn single(predicate: DirectedPredicate) -> Self {
        RelationExpr::Single(predicate)
    }

    /// Join a head-side hop with the (already reversed) tail-side hop,
    /// collapsing to the single predicate when both hops agree on a
    /// transitive predicate.
    pub fn join(
        head: DirectedPredicate,
        reversed_tail: DirectedPredicate,
        transitive: &BTreeSet<String>,
    ) -> Self {
        if head == reversed_tail && transitive.contains(&head.pid) {
            RelationExpr::Single(head)
        } else {
            RelationExpr::Path(head, reversed_tail)
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, RelationExpr::Path(..))
    }

    /// Whether any hop traverses backward.
    pub fn has_inverse(&self) -> bool {
        match self {
            RelationExpr::Single(p) => p.inverse,
            RelationExpr::Path(a, b) => a.inverse || b.inverse,
        }
    }

    pub fn predicates(&self) -> Vec<&DirectedPredicate> {
        match self {
            RelationExpr::Single(p) => vec![p],
            RelationExpr::Path(a, b) => vec![a, b],
        }
    }

    /// Parse the wire form (`P57`, `(-)P57`, `P57::(-)P161`). Returns
    /// `None` for expressions with more than two hops.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split("::");
        let first = DirectedPredicate::parse(parts.next()?);
        match parts.next() {
            None => Some(RelationExpr::Single(first)),
            Some(second) => {
                if parts.next().is_some() {
                    return None;
                }
                Some(RelationExpr::Path(first, DirectedPredicate::parse(second)))
            }
        }
    }
}

impl std::fmt::Display for RelationExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationExpr::Single(p) => write!(f, "{p}"),
            RelationExpr::Path(a, b) => write!(f, "{a}::{b}"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
