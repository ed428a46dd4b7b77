//! Ambiguity resolution: identical-label candidates separated by row
//! context (Paris the Texan city vs. the French capital) and by column
//! types (Georgetown the city vs. the university).

use tabsem_core::{annotate_table, AnnotationConfig};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{
    city_lookup, preprocessed, raw, seed_city_world, typing, RecordBuilder,
};

#[test]
fn texas_context_beats_label_popularity() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    let rows: &[&[&str]] = &[&["Paris", "Texas"], &["Austin", "Texas"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(rows, vec![typing(&[("GPE", 0.9)]), typing(&[("GPE", 0.9)])]),
        &city_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    // both lookup candidates carry the exact label "Paris"; only the
    // located-in edge to Texas separates them
    let paris = annotated
        .cea
        .iter()
        .find(|e| e.row == 0 && e.column == 0)
        .unwrap();
    assert!(
        paris.annotation.uri.ends_with("Q830149"),
        "expected Paris (Texas), got {}",
        paris.annotation.uri
    );

    // and the pair annotates as located-in
    let cpa = annotated
        .cpa
        .iter()
        .find(|c| c.head_column == 0 && c.tail_column == 1)
        .expect("missing CPA(0,1)");
    assert!(cpa.annotation.uri.ends_with("P131"));
    assert_eq!(cpa.annotation.coverage, 1.0);
}

#[test]
fn column_type_breaks_equal_similarity_ties() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);
    // two Georgetowns with identical lookup scores: a city and a university
    kb.put(
        "Q49145",
        RecordBuilder::new("Georgetown")
            .forward("P31", &[("Q515", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q333886",
        RecordBuilder::new("Georgetown")
            .forward("P31", &[("Q3918", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q3918",
        RecordBuilder::new("university")
            .forward("P279", &[("Q2385804", "NORMAL")])
            .build(),
    );

    let mut lookup = city_lookup();
    lookup.insert(
        "georgetown",
        vec![
            tabsem_core::LookupEntity {
                entity: "Q49145".into(),
                score: Some(0.9),
            },
            tabsem_core::LookupEntity {
                entity: "Q333886".into(),
                score: Some(0.9),
            },
        ],
    );

    let rows: &[&[&str]] = &[&["Paris"], &["Berlin"], &["Georgetown"]];
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

    // the column's CTA (city) must lift the city Georgetown over the
    // equally-similar university
    let georgetown = annotated
        .cea
        .iter()
        .find(|e| e.row == 2 && e.column == 0)
        .unwrap();
    assert!(
        georgetown.annotation.uri.ends_with("Q49145"),
        "expected the city, got {}",
        georgetown.annotation.uri
    );
}
