//! Numeric-with-unit context: "5 km" in the table matches a KB length of
//! 5000 metres after base-unit conversion, and the pair annotates with the
//! length property.

use tabsem_core::{annotate_table, AnnotationConfig, LookupEntity, StaticLookup};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{preprocessed, raw, seed_vocabulary, typing, RecordBuilder};

fn seed_trails(kb: &TestKbManager) {
    seed_vocabulary(kb);
    kb.put(
        "Q77001",
        RecordBuilder::new("Alpine Trail")
            .forward("P31", &[("Q2143825", "NORMAL")])
            .forward("P2043", &[("5000", "Quantity-Q11573")])
            .build(),
    );
    kb.put(
        "Q77002",
        RecordBuilder::new("Ridge Trail")
            .forward("P31", &[("Q2143825", "NORMAL")])
            .forward("P2043", &[("12000", "Quantity-Q11573")])
            .build(),
    );
    kb.put("Q2143825", RecordBuilder::new("hiking trail").build());
}

fn trail_lookup() -> StaticLookup {
    let mut lookup = StaticLookup::new();
    lookup.insert(
        "alpine trail",
        vec![LookupEntity {
            entity: "Q77001".into(),
            score: Some(1.0),
        }],
    );
    lookup.insert(
        "ridge trail",
        vec![LookupEntity {
            entity: "Q77002".into(),
            score: Some(1.0),
        }],
    );
    lookup
}

#[test]
fn unit_conversion_links_the_length_column() {
    let kb = TestKbManager::new();
    seed_trails(&kb);

    let rows: &[&[&str]] = &[&["Alpine Trail", "5 km"], &["Ridge Trail", "12 km"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(
            rows,
            vec![typing(&[("LOC", 0.8)]), typing(&[("DISTANCE", 0.9)])],
        ),
        &trail_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    let cpa = annotated
        .cpa
        .iter()
        .find(|c| c.head_column == 0 && c.tail_column == 1)
        .expect("missing CPA over the quantity column");
    assert_eq!(cpa.annotation.label, "length");
    assert!(cpa.annotation.uri.ends_with("P2043"));
    assert_eq!(cpa.annotation.coverage, 1.0);

    let trail = annotated
        .cea
        .iter()
        .find(|e| e.row == 0 && e.column == 0)
        .unwrap();
    assert!(trail.annotation.uri.ends_with("Q77001"));
}

#[test]
fn mismatched_magnitudes_do_not_link() {
    let kb = TestKbManager::new();
    seed_trails(&kb);

    // the cell quantities are far from the stored lengths
    let rows: &[&[&str]] = &[&["Alpine Trail", "40 km"], &["Ridge Trail", "2 km"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(
            rows,
            vec![typing(&[("LOC", 0.8)]), typing(&[("DISTANCE", 0.9)])],
        ),
        &trail_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    assert!(!annotated
        .cpa
        .iter()
        .any(|c| c.head_column == 0 && c.tail_column == 1));
}
