//! Table coordinates and candidate identity
//!
//! Small copy/clone value types shared by every stage of the pipeline:
//! cells, ordered column pairs, candidate entities and column roles.

use serde::{Deserialize, Serialize};

// ============================================================================
// COORDINATES
// ============================================================================

/// A table cell, addressed by data-row and column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// An ordered pair of columns (head → tail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnPair {
    pub head: usize,
    pub tail: usize,
}

impl ColumnPair {
    pub fn new(head: usize, tail: usize) -> Self {
        Self { head, tail }
    }
}

/// A candidate entity for one cell: the cell position plus a KB identifier.
///
/// Two candidates with the same id in different cells are distinct; the
/// subgraph they share is cached by id only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate {
    pub row: usize,
    pub col: usize,
    pub id: String,
}

impl Candidate {
    pub fn new(row: usize, col: usize, id: impl Into<String>) -> Self {
        Self {
            row,
            col,
            id: id.into(),
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }
}

// ============================================================================
// COLUMN ROLES
// ============================================================================

/// Role assigned to a column by preprocessing-typing derivation.
///
/// A column is either an entity column or exactly one kind of literal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Values denote KB entities; cells get lookup candidates.
    Entity,
    /// Date values.
    Date,
    /// Numbers carrying a measurement unit ("5 km", "$20").
    NumericWithUnit,
    /// Plain numbers without a unit. Matching is reserved; such columns
    /// never raise a context score above the floor.
    NumericPlain,
    /// Free text.
    Textual,
    /// A leading ordinal/row-number column.
    Index,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Entity => "entity",
            ColumnRole::Date => "date",
            ColumnRole::NumericWithUnit => "numeric_with_unit",
            ColumnRole::NumericPlain => "numeric_plain",
            ColumnRole::Textual => "textual",
            ColumnRole::Index => "index",
        }
    }

    /// Any role other than `Entity`.
    pub fn is_literal(&self) -> bool {
        !matches!(self, ColumnRole::Entity)
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
