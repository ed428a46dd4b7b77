//! Contextless-cell reinforcement: a cell whose row context matches
//! nothing still prefers candidates that carry one of the table's accepted
//! CPAs in their own predicate set.

use tabsem_core::{annotate_table, AnnotationConfig, LookupEntity};
use tabsem_e2e::harness::TestKbManager;
use tabsem_e2e::mocks::{film_lookup, preprocessed, raw, seed_film_world, typing, RecordBuilder};

#[test]
fn cpa_bearing_candidate_wins_a_contextless_cell() {
    let kb = TestKbManager::new();
    seed_film_world(&kb);
    // two Zodiac films with identical lookup scores; neither connects to
    // the actor in its row, but only the first carries a cast-member edge
    // at all
    kb.put(
        "Q320588",
        RecordBuilder::new("Zodiac")
            .forward("P31", &[("Q11424", "NORMAL")])
            .forward("P161", &[("Q59945", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q999777",
        RecordBuilder::new("Zodiac")
            .forward("P31", &[("Q11424", "NORMAL")])
            .build(),
    );
    kb.put(
        "Q59945",
        RecordBuilder::new("Mark Ruffalo")
            .forward("P31", &[("Q5", "NORMAL")])
            .build(),
    );

    let mut lookup = film_lookup();
    lookup.insert(
        "zodiac",
        vec![
            LookupEntity {
                entity: "Q320588".into(),
                score: Some(1.0),
            },
            LookupEntity {
                entity: "Q999777".into(),
                score: Some(1.0),
            },
        ],
    );

    let rows: &[&[&str]] = &[&["Pulp Fiction", "Travolta"], &["Zodiac", "Craig"]];
    let output = annotate_table(
        kb.accessor(),
        raw(rows),
        preprocessed(
            rows,
            vec![typing(&[("WORK_OF_ART", 0.9)]), typing(&[("PERSON", 0.85)])],
        ),
        &lookup,
        "test_index",
        AnnotationConfig::default(),
    )
    .unwrap();
    let annotated = output.annotated.expect("engine should annotate");

    // the first row discovers cast member as the pair's CPA
    let cpa = annotated
        .cpa
        .iter()
        .find(|c| c.head_column == 0 && c.tail_column == 1)
        .expect("missing CPA(0,1)");
    assert!(cpa.annotation.uri.ends_with("P161"));
    assert_eq!(cpa.annotation.coverage, 0.5);

    // the Zodiac cell is contextless; the P161-bearing candidate must win
    let zodiac = annotated
        .cea
        .iter()
        .find(|e| e.row == 1 && e.column == 0)
        .unwrap();
    assert!(
        zodiac.annotation.uri.ends_with("Q320588"),
        "expected the cast-member-bearing film, got {}",
        zodiac.annotation.uri
    );
}
