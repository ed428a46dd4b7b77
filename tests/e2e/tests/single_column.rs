//! Single-column entity table: no context exists, similarity decides CEA,
//! CPA stays empty and CTA still types the column.

use tabsem_core::{annotate_table, AnnotationConfig};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{city_lookup, preprocessed, raw, seed_city_world, typing};

#[test]
fn city_column_gets_similarity_ceas_and_city_cta() {
    let kb = TestKbManager::new();
    seed_city_world(&kb);

    let rows: &[&[&str]] = &[&["Paris"], &["Berlin"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(rows, vec![typing(&[("GPE", 0.9)])]),
        &city_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    // similarity passthrough: exact-label matches score 1.0
    let berlin = annotated
        .cea
        .iter()
        .find(|e| e.row == 1 && e.column == 0)
        .unwrap();
    assert!(berlin.annotation.uri.ends_with("Q64"));
    assert_eq!(berlin.annotation.score, 1.0);

    let paris = annotated
        .cea
        .iter()
        .find(|e| e.row == 0 && e.column == 0)
        .unwrap();
    assert_eq!(paris.annotation.label, "Paris");

    // no pairs exist in a one-column table
    assert!(annotated.cpa.is_empty());

    // the column types as city, with human settlement riding along as the
    // supertype secondary
    let cta = annotated.cta.iter().find(|c| c.column == 0).unwrap();
    assert!(cta.annotation[0].uri.ends_with("Q515"));
    assert_eq!(cta.annotation[0].label, "city");
    assert_eq!(cta.annotation[0].coverage, 1.0);
    assert!(cta.annotation.iter().any(|t| t.uri.ends_with("Q486972")));
}
