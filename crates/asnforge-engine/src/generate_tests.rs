//! Tests for the driving loop

use asnforge_constraint::{AttrConstraint, ConstraintTree};
use asnforge_core::{AsnError, Item, WorkOver};
use asnforge_test::{exposure, nircam_miri_pool};

use super::generate::*;
use super::registry::Registry;
use super::rule::Rule;

fn image_registry() -> Registry {
    Registry::builder()
        .register(Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![
                AttrConstraint::new(["instrument"]).pattern("nircam").into(),
                AttrConstraint::new(["filter"]).named("opt_elem").into(),
            ]),
        ))
        .build()
        .unwrap()
}

fn candidate_registry() -> Registry {
    Registry::builder()
        .register(Rule::new(
            "Asn_Candidate",
            ConstraintTree::all(vec![AttrConstraint::new(["asn_candidate"])
                .evaluate(true)
                .named("candidate")
                .into()]),
        ))
        .build()
        .unwrap()
}

fn opt_elem(result: &GenerateResult, idx: usize) -> Option<String> {
    result.associations[idx]
        .constraints()
        .get("opt_elem")
        .unwrap()
        .value()
}

#[test]
fn test_pool_grouped_by_locked_filter() {
    let pool = nircam_miri_pool();
    let result = generate(&pool, &image_registry(), &GenerateOptions::default()).unwrap();

    assert_eq!(result.associations.len(), 2);
    assert_eq!(result.associations[0].members(), &pool[..2]);
    assert_eq!(opt_elem(&result, 0).as_deref(), Some("F200W"));
    assert_eq!(result.associations[1].members(), &pool[2..3]);
    assert_eq!(opt_elem(&result, 1).as_deref(), Some("F444W"));

    assert_eq!(result.orphans, vec![pool[3].clone()]);
    assert_eq!(result.exit_status(), ExitStatus::Unmatched);
    assert_eq!(result.exit_status().code(), 1);
}

#[test]
fn test_rules_seed_scope_never_extends() {
    let pool = nircam_miri_pool();
    let options = GenerateOptions::new().with_seed_scope(WorkOver::Rules);
    let result = generate(&pool, &image_registry(), &options).unwrap();

    assert_eq!(result.associations.len(), 3);
    assert!(result.associations.iter().all(|asn| asn.members().len() == 1));
    assert_eq!(result.orphans.len(), 1);
}

#[test]
fn test_sequence_numbers_follow_creation_order() {
    let pool = nircam_miri_pool();
    let result = generate(&pool, &image_registry(), &GenerateOptions::default()).unwrap();

    let names: Vec<String> = result
        .associations
        .iter()
        .map(|asn| asn.name().unwrap())
        .collect();
    assert_eq!(names, vec!["Asn_Image_001", "Asn_Image_002"]);
}

#[test]
fn test_expansion_converges() {
    let pool = vec![Item::new().with("asn_candidate", "[o001, o002, c1000]")];
    let result = generate(&pool, &candidate_registry(), &GenerateOptions::default()).unwrap();

    let candidates: Vec<Option<String>> = result
        .associations
        .iter()
        .map(|asn| asn.constraints().get("candidate").unwrap().value())
        .collect();
    assert_eq!(
        candidates,
        vec![
            Some("o001".to_string()),
            Some("o002".to_string()),
            Some("c1000".to_string())
        ]
    );
    for asn in &result.associations {
        assert_eq!(asn.members().len(), 1);
        assert_eq!(asn.members()[0].origin(), Some(0));
    }
    assert!(result.orphans.is_empty());
    assert_eq!(result.exit_status(), ExitStatus::Success);
    assert_eq!(result.stats.process_lists, 2);
    assert_eq!(result.stats.reprocess_lists, 1);
}

#[test]
fn test_expanded_items_join_existing_associations() {
    let pool = vec![
        Item::new().with("asn_candidate", "o001"),
        Item::new().with("asn_candidate", "[o001, o002]"),
    ];
    let result = generate(&pool, &candidate_registry(), &GenerateOptions::default()).unwrap();

    assert_eq!(result.associations.len(), 2);
    let first = &result.associations[0];
    assert_eq!(first.members().len(), 2);
    assert_eq!(first.members()[1].origin(), Some(1));
    assert_eq!(first.members()[1].text("asn_candidate"), Some("o001"));
    assert_eq!(result.associations[1].members().len(), 1);
}

#[test]
fn test_worklist_limit() {
    let pool = vec![Item::new().with("asn_candidate", "[o001, o002]")];
    let options = GenerateOptions::new().with_worklist_limit(1);

    assert!(matches!(
        generate(&pool, &candidate_registry(), &options),
        Err(AsnError::InvalidState(_))
    ));
    assert!(generate(
        &pool,
        &candidate_registry(),
        &GenerateOptions::new().with_worklist_limit(2)
    )
    .is_ok());
}

#[test]
fn test_finalize_callbacks_run() {
    let registry = Registry::builder()
        .register(Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![AttrConstraint::new(["filter"]).into()]),
        ))
        .on_finalize(|asns| asns.into_iter().filter(|a| a.members().len() > 1).collect())
        .build()
        .unwrap();
    let pool = vec![
        exposure("NIRCAM", "F200W"),
        exposure("NIRCAM", "F444W"),
        exposure("NIRCAM", "F200W"),
    ];

    let result = generate(&pool, &registry, &GenerateOptions::default()).unwrap();

    assert_eq!(result.associations.len(), 1);
    assert_eq!(result.associations[0].members().len(), 2);
    assert!(result.orphans.is_empty());
}

#[test]
fn test_statistics() {
    let pool = nircam_miri_pool();
    let result = generate(&pool, &image_registry(), &GenerateOptions::default()).unwrap();

    assert_eq!(result.stats.pool_items, 4);
    assert_eq!(result.stats.process_lists, 1);
    assert_eq!(result.stats.items_offered, 4);
    assert_eq!(result.stats.associations_created, 2);
    assert_eq!(result.stats.existing_matches, 1);
    assert_eq!(result.stats.orphans, 1);
}

#[test]
fn test_empty_pool() {
    let result = generate(&[], &image_registry(), &GenerateOptions::default()).unwrap();
    assert!(result.associations.is_empty());
    assert!(result.orphans.is_empty());
    assert_eq!(result.exit_status(), ExitStatus::Success);
}
