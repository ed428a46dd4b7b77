//! Film / actor / date table: the canonical three-column scenario.
//!
//! Expects film CEAs in column 0, actor CEAs in column 1, "cast member"
//! for the (0,1) pair and "publication date" for the (0,2) pair.

use tabsem_core::{annotate_table, AnnotationConfig};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{film_lookup, film_rows, film_table, seed_film_world};

#[test]
fn film_actor_date_annotations() {
    let kb = TestKbManager::new();
    seed_film_world(&kb);

    let output = annotate_table(
        kb.accessor(),
        film_rows(),
        film_table(),
        &film_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    // CEA: films in column 0, actors in column 1
    let cea_uri = |row: usize, col: usize| -> String {
        annotated
            .cea
            .iter()
            .find(|e| e.row == row && e.column == col)
            .unwrap_or_else(|| panic!("missing CEA at ({row}, {col})"))
            .annotation
            .uri
            .clone()
    };
    assert!(cea_uri(0, 0).ends_with("Q104123"));
    assert!(cea_uri(1, 0).ends_with("Q2201"));
    assert!(cea_uri(0, 1).ends_with("Q36268"));
    assert!(cea_uri(1, 1).ends_with("Q4547"));

    // CTA: column 0 is typed film, column 1 human/actor
    let cta0 = annotated.cta.iter().find(|c| c.column == 0).unwrap();
    assert!(cta0.annotation[0].uri.ends_with("Q11424"));
    assert_eq!(cta0.annotation[0].label, "film");
    let cta1 = annotated.cta.iter().find(|c| c.column == 1).unwrap();
    assert!(cta1
        .annotation
        .iter()
        .any(|t| t.uri.ends_with("Q5") || t.uri.ends_with("Q33999")));

    // CPA: cast member between the entity columns, publication date to the
    // date column
    let cpa01 = annotated
        .cpa
        .iter()
        .find(|c| c.head_column == 0 && c.tail_column == 1)
        .expect("missing CPA(0,1)");
    assert_eq!(cpa01.annotation.label, "cast member");
    assert!(cpa01.annotation.uri.ends_with("P161"));
    assert_eq!(cpa01.annotation.coverage, 1.0);

    let cpa02 = annotated
        .cpa
        .iter()
        .find(|c| c.head_column == 0 && c.tail_column == 2)
        .expect("missing CPA(0,2)");
    assert_eq!(cpa02.annotation.label, "publication date");
    assert!(cpa02.annotation.uri.ends_with("P577"));

    // the actor column never relates to the date column
    assert!(!annotated
        .cpa
        .iter()
        .any(|c| c.head_column == 1 && c.tail_column == 2));
}

#[test]
fn film_output_is_well_formed() {
    let kb = TestKbManager::new();
    seed_film_world(&kb);

    let output = annotate_table(
        kb.accessor(),
        film_rows(),
        film_table(),
        &film_lookup(),
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.unwrap();

    assert_eq!(output.avg_lookup_candidate, 1.0);
    assert!(output.abnormal_mentions.is_empty());
    assert_eq!(annotated.table_data_revised.len(), 2);

    for entry in &annotated.cea {
        assert!(entry.annotation.score >= 0.0 && entry.annotation.score <= 1.0);
        assert!(!entry.annotation.label.is_empty());
    }
    for entry in &annotated.cta {
        for t in &entry.annotation {
            assert!(t.coverage >= 0.0 && t.coverage <= 1.0);
            assert!(t.score >= 0.0 && t.score <= 1.0);
        }
    }
    for entry in &annotated.cpa {
        assert!(entry.annotation.coverage >= 0.0 && entry.annotation.coverage <= 1.0);
    }
}
