//! Fixture knowledge bases, lookups and preprocessed tables
//!
//! Small hand-built Wikidata-shaped worlds for the scenario tests: films
//! with cast members and publication dates, cities and their taxonomy,
//! hiking trails with length quantities.

use std::collections::{BTreeMap, BTreeSet};

use tabsem_core::{
    ColumnTyping, EntityRecord, HeaderInfo, LookupEntity, PredicateObjects, PreprocessedTable,
    StaticLookup, TypingScore,
};

use crate::harness::TestKbManager;

// ============================================================================
// RECORD BUILDER
// ============================================================================

/// Fluent builder for seed records.
pub struct RecordBuilder {
    record: EntityRecord,
}

impl RecordBuilder {
    pub fn new(label: &str) -> Self {
        Self {
            record: EntityRecord {
                labels: vec![label.to_string()],
                ..Default::default()
            },
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.record.aliases.push(alias.to_string());
        self
    }

    /// Forward edges: object → rank tag (entities) or literal-type tag.
    pub fn forward(mut self, pid: &str, objects: &[(&str, &str)]) -> Self {
        let map: BTreeMap<String, String> = objects
            .iter()
            .map(|(o, t)| (o.to_string(), t.to_string()))
            .collect();
        self.record
            .edges
            .insert(pid.to_string(), PredicateObjects::Forward(map));
        self
    }

    /// Backward edges: subjects pointing at this entity.
    pub fn backward(mut self, pid: &str, subjects: &[&str]) -> Self {
        let set: BTreeSet<String> = subjects.iter().map(|s| s.to_string()).collect();
        self.record
            .edges
            .insert(format!("(-){pid}"), PredicateObjects::Backward(set));
        self
    }

    pub fn build(self) -> EntityRecord {
        self.record
    }
}

// ============================================================================
// TABLE BUILDING
// ============================================================================

pub fn typing(pairs: &[(&str, f64)]) -> ColumnTyping {
    ColumnTyping {
        typing: pairs
            .iter()
            .map(|(label, score)| TypingScore {
                typing_label: label.to_string(),
                typing_score: *score,
            })
            .collect(),
    }
}

pub fn preprocessed(rows: &[&[&str]], typings: Vec<ColumnTyping>) -> PreprocessedTable {
    PreprocessedTable {
        table_data_revised: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
        header_info: HeaderInfo {
            has_header: false,
            header_row_index: 0,
        },
        primitive_typing: typings,
    }
}

pub fn raw(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn hit(id: &str, score: f64) -> LookupEntity {
    LookupEntity {
        entity: id.to_string(),
        score: Some(score),
    }
}

// ============================================================================
// SHARED VOCABULARY
// ============================================================================

/// Seed labels for the properties and base types every fixture shares.
pub fn seed_vocabulary(kb: &TestKbManager) {
    kb.put("P31", RecordBuilder::new("instance of").build());
    kb.put("P161", RecordBuilder::new("cast member").build());
    kb.put("P577", RecordBuilder::new("publication date").build());
    kb.put("P2043", RecordBuilder::new("length").build());
    kb.put(
        "P131",
        RecordBuilder::new("located in the administrative territorial entity").build(),
    );
    kb.put(
        "Q11424",
        RecordBuilder::new("film")
            .forward("P279", &[("Q2431196", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q2431196",
        RecordBuilder::new("audiovisual work")
            .forward("P279", &[("Q386724", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q5",
        RecordBuilder::new("human")
            .forward("P279", &[("Q154954", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q33999",
        RecordBuilder::new("actor")
            .forward("P279", &[("Q713200", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q515",
        RecordBuilder::new("city")
            .forward("P279", &[("Q486972", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q486972",
        RecordBuilder::new("human settlement")
            .forward("P279", &[("Q27096213", "NORMAL")])
            .build(),
    );
    // metre, with its unit symbol
    kb.put(
        "Q11573",
        RecordBuilder::new("metre")
            .forward("P5061", &[("m", "String")])
            .build(),
    );
}

// ============================================================================
// FILM WORLD (scenario: films / actors / publication dates)
// ============================================================================

/// Films with cast members and publication dates, plus their actors.
pub fn seed_film_world(kb: &TestKbManager) {
    seed_vocabulary(kb);
    kb.put(
        "Q104123",
        RecordBuilder::new("Pulp Fiction")
            .forward("P31", &[("Q11424", "NORMAL")])
            .forward("P161", &[("Q36268", "NORMAL")])
            .forward("P577", &[("1994-10-14T00:00:00Z", "DateTime-Gregorian")])
            .build(),
    );
    kb.put(
        "Q2201",
        RecordBuilder::new("Casino Royale")
            .forward("P31", &[("Q11424", "NORMAL")])
            .forward("P161", &[("Q4547", "NORMAL")])
            .forward("P577", &[("2006-11-14T00:00:00Z", "DateTime-Gregorian")])
            .build(),
    );
    kb.put(
        "Q36268",
        RecordBuilder::new("John Travolta")
            .alias("Travolta")
            .forward("P31", &[("Q5", "NORMAL")])
            .forward("P106", &[("Q33999", "NORMAL")])
            .backward("P161", &["Q104123"])
            .build(),
    );
    kb.put(
        "Q4547",
        RecordBuilder::new("Daniel Craig")
            .alias("Craig")
            .forward("P31", &[("Q5", "NORMAL")])
            .forward("P106", &[("Q33999", "NORMAL")])
            .backward("P161", &["Q2201"])
            .build(),
    );
}

pub fn film_lookup() -> StaticLookup {
    let mut lookup = StaticLookup::new();
    lookup.insert("pulp fiction", vec![hit("Q104123", 1.0)]);
    lookup.insert("casino royale", vec![hit("Q2201", 1.0)]);
    lookup.insert("travolta", vec![hit("Q36268", 0.95)]);
    lookup.insert("craig", vec![hit("Q4547", 0.95)]);
    lookup
}

/// `[[Pulp Fiction, Travolta, 1994], [Casino Royale, Craig, 2006]]` with
/// roles entity / entity / date.
pub fn film_table() -> PreprocessedTable {
    preprocessed(
        &[
            &["Pulp Fiction", "Travolta", "1994"],
            &["Casino Royale", "Craig", "2006"],
        ],
        vec![
            typing(&[("WORK_OF_ART", 0.9)]),
            typing(&[("PERSON", 0.85)]),
            typing(&[("DATE", 0.95)]),
        ],
    )
}

pub fn film_rows() -> Vec<Vec<String>> {
    raw(&[
        &["Pulp Fiction", "Travolta", "1994"],
        &["Casino Royale", "Craig", "2006"],
    ])
}

// ============================================================================
// CITY WORLD (scenarios: single column, Paris/Texas ambiguity)
// ============================================================================

pub fn seed_city_world(kb: &TestKbManager) {
    seed_vocabulary(kb);
    kb.put(
        "Q90",
        RecordBuilder::new("Paris")
            .alias("City of Light")
            .forward("P31", &[("Q515", "NORMAL")])
            .forward("P131", &[("Q212429", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q830149",
        RecordBuilder::new("Paris")
            .alias("Paris, Texas")
            .forward("P31", &[("Q515", "NORMAL")])
            .forward("P131", &[("Q1439", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q64",
        RecordBuilder::new("Berlin")
            .forward("P31", &[("Q515", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q16559",
        RecordBuilder::new("Austin")
            .forward("P31", &[("Q515", "NORMAL")])
            .forward("P131", &[("Q1439", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q1439",
        RecordBuilder::new("Texas")
            .forward("P31", &[("Q35657", "NORMAL")])
            .backward("P131", &["Q830149", "Q16559"])
            .build(),
    );
    kb.put(
        "Q212429",
        RecordBuilder::new("\u{00CE}le-de-France")
            .backward("P131", &["Q90"])
            .build(),
    );
    kb.put("Q35657", RecordBuilder::new("U.S. state").build());
}

pub fn city_lookup() -> StaticLookup {
    let mut lookup = StaticLookup::new();
    lookup.insert("paris", vec![hit("Q90", 1.0), hit("Q830149", 1.0)]);
    lookup.insert("berlin", vec![hit("Q64", 1.0)]);
    lookup.insert("austin", vec![hit("Q16559", 1.0)]);
    lookup.insert("texas", vec![hit("Q1439", 1.0)]);
    lookup
}
