//! Degradation paths: unusable preprocessing, empty lookups, malformed
//! lookup entries and entities missing from the store.

use tabsem_core::{
    annotate_table, AnnotationConfig, EntityLookup, LookupEntity, LookupMatch, LookupRequest,
    LookupResponse, PreprocessedTable, StaticLookup,
};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{preprocessed, raw, seed_city_world, typing};

#[test]
fn unusable_preprocessing_returns_raw_echo_only() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    let output = annotate_table(
        kb.accessor(),
        raw(&[&["Paris"]]),
        PreprocessedTable::default(),
        &StaticLookup::new(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();

    assert!(output.annotated.is_none());
    assert_eq!(output.raw.table_data_raw, raw(&[&["Paris"]]));
}

#[test]
fn empty_lookup_returns_raw_echo_only() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    let rows: &[&[&str]] = &[&["Paris"], &["Berlin"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(rows, vec![typing(&[("GPE", 0.9)])]),
        &StaticLookup::new(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();

    assert!(output.annotated.is_none());
}

/// Lookup whose entry for one label is malformed (no entities field).
struct HalfBrokenLookup;

impl EntityLookup for HalfBrokenLookup {
    fn lookup(&self, request: &LookupRequest) -> LookupResponse {
        let output = request
            .labels
            .iter()
            .map(|label| {
                if label == "berlin" {
                    LookupMatch {
                        label: label.clone(),
                        entities: Some(vec![LookupEntity {
                            entity: "Q64".into(),
                            score: Some(1.0),
                        }]),
                    }
                } else {
                    LookupMatch {
                        label: label.clone(),
                        entities: None,
                    }
                }
            })
            .collect();
        LookupResponse {
            execution_time_sec: 0.1,
            output,
        }
    }
}

#[test]
fn malformed_entries_are_reported_not_fatal() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    let rows: &[&[&str]] = &[&["Paris"], &["Berlin"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(rows, vec![typing(&[("GPE", 0.9)])]),
        &HalfBrokenLookup,
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();

    let annotated = output.annotated.expect("one good mention is enough");
    assert!(output.abnormal_mentions.contains(&"paris".to_string()));
    assert!(annotated
        .cea
        .iter()
        .any(|e| e.annotation.uri.ends_with("Q64")));
}

#[test]
fn entity_missing_from_store_still_participates() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    // lookup knows an id the store has never seen
    let mut lookup = StaticLookup::new();
    lookup.insert(
        "atlantis",
        vec![LookupEntity {
            entity: "Q404404".into(),
            score: Some(0.8),
        }],
    );
    lookup.insert(
        "berlin",
        vec![LookupEntity {
            entity: "Q64".into(),
            score: Some(1.0),
        }],
    );

    let rows: &[&[&str]] = &[&["Atlantis"], &["Berlin"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(rows, vec![typing(&[("GPE", 0.9)])]),
        &lookup,
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    // the ghost candidate still gets a similarity-only CEA, labeled with
    // the fallback
    let atlantis = annotated
        .cea
        .iter()
        .find(|e| e.row == 0 && e.column == 0)
        .expect("missing CEA for the unknown entity");
    assert_eq!(atlantis.annotation.label, "No English Label");
    assert_eq!(atlantis.annotation.score, 0.8);
}
