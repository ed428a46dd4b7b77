//! Preprocessor output and column-role derivation
//!
//! The engine does not preprocess tables itself; it consumes the revised
//! table emitted by the external preprocessing service (orientation fixed,
//! header detected, per-column primitive typings scored) and derives column
//! roles from it:
//!
//! - entity columns: object-like typings dominate and cell contents are
//!   lookupable (not over-long, not heavily punctuated)
//! - literal columns: partitioned into date / numeric-with-unit /
//!   numeric-plain / textual / index

use serde::{Deserialize, Serialize};

use super::model::ColumnRole;

// ============================================================================
// PREPROCESSOR OUTPUT
// ============================================================================

/// One primitive-typing guess for a column, e.g. `("PERSON", 0.8)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingScore {
    pub typing_label: String,
    pub typing_score: f64,
}

/// Ordered (score-descending) typing guesses for one column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTyping {
    pub typing: Vec<TypingScore>,
}

/// Header detection result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderInfo {
    pub has_header: bool,
    /// Row index of the header when `has_header` is set.
    #[serde(default)]
    pub header_row_index: usize,
}

/// The preprocessed table handed to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessedTable {
    /// Revised 2D data, already oriented horizontally.
    pub table_data_revised: Vec<Vec<String>>,
    pub header_info: HeaderInfo,
    /// One entry per column, same order as the table.
    #[serde(default)]
    pub primitive_typing: Vec<ColumnTyping>,
}

impl PreprocessedTable {
    /// Index of the first data row (rows before it belong to the header).
    pub fn first_data_row(&self) -> usize {
        if self.header_info.has_header {
            self.header_info.header_row_index + 1
        } else {
            0
        }
    }

    pub fn num_rows(&self) -> usize {
        self.table_data_revised.len()
    }

    pub fn num_columns(&self) -> usize {
        self.table_data_revised.first().map_or(0, |r| r.len())
    }

    /// A table the engine can work with: non-empty, rectangular, with a
    /// typing entry per column and at least one data row.
    pub fn is_usable(&self) -> bool {
        let cols = self.num_columns();
        cols > 0
            && self.num_rows() > self.first_data_row()
            && self.table_data_revised.iter().all(|r| r.len() == cols)
            && self.primitive_typing.len() == cols
    }
}

// ============================================================================
// TYPING-LABEL FAMILIES
// ============================================================================

/// Typing labels that denote a named entity.
pub fn is_named_entity_typing(label: &str) -> bool {
    matches!(
        label,
        "UNKNOWN"
            | "PERSON"
            | "ORG"
            | "FAC"
            | "GPE"
            | "LANGUAGE"
            | "LAW"
            | "LOC"
            | "NORP"
            | "PRODUCT"
            | "WORK_OF_ART"
            | "EVENT"
    )
}

pub fn is_date_typing(label: &str) -> bool {
    label == "DATE"
}

/// Typing labels for quantities that carry a measurement unit.
pub fn is_unit_numeric_typing(label: &str) -> bool {
    const WITH_UNIT: &[&str] = &[
        "PERCENT",
        "DISTANCE",
        "MASS",
        "MONEY",
        "DURATION",
        "TEMPERATURE",
        "CHARGE",
        "ANGLE",
        "DATA STORAGE",
        "AMOUNT OF SUBSTANCE",
        "CATALYTIC ACTIVITY",
        "AREA",
        "VOLUME",
        "VOLUME (LUMBER)",
        "FORCE",
        "PRESSURE",
        "ENERGY",
        "POWER",
        "SPEED",
        "ACCELERATION",
        "FUEL ECONOMY",
        "FUEL CONSUMPTION",
        "ANGULAR SPEED",
        "ANGULAR ACCELERATION",
        "DENSITY",
        "SPECIFIC VOLUME",
        "MOMENT OF INERTIA",
        "TORQUE",
        "THERMAL RESISTANCE",
        "THERMAL CONDUCTIVITY",
        "SPECIFIC HEAT CAPACITY",
        "VOLUMETRIC FLOW",
        "MASS FLOW",
        "CONCENTRATION",
        "DYNAMIC VISCOSITY",
        "KINEMATIC VISCOSITY",
        "FLUIDITY",
        "SURFACE TENSION",
        "PERMEABILITY",
        "SOUND LEVEL",
        "LUMINOUS INTENSITY",
        "LUMINOUS FLUX",
        "ILLUMINANCE",
        "LUMINANCE",
        "TYPOGRAPHICAL ELEMENT",
        "IMAGE RESOLUTION",
        "FREQUENCY",
        "INSTANCE FREQUENCY",
        "FLUX DENSITY",
        "LINEAR MASS DENSITY",
        "LINEAR CHARGE DENSITY",
        "SURFACE CHARGE DENSITY",
        "CHARGE DENSITY",
        "CURRENT",
        "LINEAR CURRENT DENSITY",
        "SURFACE CURRENT DENSITY",
        "ELECTRIC POTENTIAL",
        "ELECTRIC FIELD",
        "ELECTRICAL RESISTANCE",
        "ELECTRICAL RESISTIVITY",
        "ELECTRICAL CONDUCTANCE",
        "ELECTRICAL CONDUCTIVITY",
        "CAPACITANCE",
        "INDUCTANCE",
        "MAGNETIC FLUX",
        "RELUCTANCE",
        "MAGNETOMOTIVE FORCE",
        "MAGNETIC FIELD",
        "IRRADIANCE",
        "RADIATION ABSORBED DOSE",
        "RADIOACTIVITY",
        "RADIATION EXPOSURE",
        "RADIATION",
        "DATA TRANSFER RATE",
    ];
    WITH_UNIT.contains(&label)
}

/// Typing labels for dimensionless numbers.
pub fn is_plain_numeric_typing(label: &str) -> bool {
    matches!(label, "CARDINAL" | "QUANTITY" | "ORDINAL")
}

// ============================================================================
// ROLE DERIVATION
// ============================================================================

const ASCII_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Derive one role per column from the primitive typings and the cell texts.
///
/// A column is an entity column when object-like typing scores sum above 0.5
/// and fewer than half of its cells are over-long (> 150 chars) or heavily
/// punctuated (> 3 distinct punctuation characters). Remaining columns are
/// partitioned by their dominant typing family; an ORDINAL column at index 0
/// becomes the index column.
pub fn derive_column_roles(table: &PreprocessedTable) -> Vec<ColumnRole> {
    let first_data_row = table.first_data_row();
    let num_rows = table.num_rows();
    let num_data_rows = (num_rows - first_data_row).max(1) as f64;

    let mut roles = Vec::with_capacity(table.num_columns());
    for (col, typings) in table.primitive_typing.iter().enumerate() {
        let mut long_cells = 0usize;
        let mut punctuated_cells = 0usize;
        for row in first_data_row..num_rows {
            let text = &table.table_data_revised[row][col];
            if text.len() > 150 {
                long_cells += 1;
            }
            let distinct_puncs = ASCII_PUNCTUATION
                .chars()
                .filter(|p| text.contains(*p))
                .count();
            if distinct_puncs > 3 {
                punctuated_cells += 1;
            }
        }

        let object_score: f64 = typings
            .typing
            .iter()
            .filter(|t| is_named_entity_typing(&t.typing_label))
            .map(|t| t.typing_score)
            .sum();

        if object_score > 0.5
            && (long_cells as f64) / num_data_rows < 0.5
            && (punctuated_cells as f64) / num_data_rows < 0.5
        {
            roles.push(ColumnRole::Entity);
            continue;
        }

        roles.push(literal_role(col, typings));
    }
    roles
}

fn literal_role(col: usize, typings: &ColumnTyping) -> ColumnRole {
    let top = typings.typing.first();
    if let Some(top) = top {
        if is_date_typing(&top.typing_label) {
            if top.typing_score > 0.5 {
                return ColumnRole::Date;
            }
        } else if col == 0 && top.typing_label == "ORDINAL" {
            return ColumnRole::Index;
        }
    }

    let mut unit_score = 0.0;
    let mut plain_score = 0.0;
    for t in &typings.typing {
        if is_unit_numeric_typing(&t.typing_label) {
            unit_score += t.typing_score;
        } else if is_plain_numeric_typing(&t.typing_label) {
            plain_score += t.typing_score;
        }
    }
    if unit_score > 0.5 {
        ColumnRole::NumericWithUnit
    } else if plain_score > 0.5 {
        ColumnRole::NumericPlain
    } else {
        ColumnRole::Textual
    }
}

// ============================================================================
// TESTS
// ============================================================================
