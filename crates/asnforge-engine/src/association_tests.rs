//! Tests for associations

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use asnforge_constraint::{AttrConstraint, ConstraintTree, SimpleConstraint};
use asnforge_core::{AsnError, Item, SequenceCounter, WorkOver};
use asnforge_test::{exposure, nircam_miri_pool, pool};

use super::association::*;
use super::members::RuleHooks;
use super::naming::TemplateNaming;
use super::rule::Rule;
use super::validity::ValidityCheck;

fn image_rule() -> Arc<Rule> {
    Arc::new(Rule::new(
        "Asn_Image",
        ConstraintTree::all(vec![
            AttrConstraint::new(["instrument"])
                .pattern("NIRCAM")
                .named("instrument")
                .into(),
            AttrConstraint::new(["filter"]).named("opt_elem").into(),
        ]),
    ))
}

fn create(rule: &Arc<Rule>, item: &Item, counter: &SequenceCounter) -> Association {
    let (asn, _) = Association::create(rule, item, WorkOver::Rules, counter, None).unwrap();
    asn.expect("item should match")
}

#[test]
fn test_create_draws_sequence_only_on_success() {
    let rule = image_rule();
    let counter = SequenceCounter::new();

    let (miss, reprocess) = Association::create(
        &rule,
        &exposure("MIRI", "F770W"),
        WorkOver::Rules,
        &counter,
        None,
    )
    .unwrap();
    assert!(miss.is_none());
    assert!(reprocess.is_empty());
    assert_eq!(counter.current("Asn_Image"), 0);

    let first = create(&rule, &exposure("NIRCAM", "F200W"), &counter);
    let second = create(&rule, &exposure("NIRCAM", "F444W"), &counter);
    assert_eq!(first.sequence(), 1);
    assert_eq!(second.sequence(), 2);
    assert_eq!(first.state(), AsnState::Active);
}

#[test]
fn test_first_match_locks_for_later_items() {
    let items = nircam_miri_pool();
    let rule = image_rule();
    let counter = SequenceCounter::new();

    let mut asn = create(&rule, &items[0], &counter);
    assert!(asn.add(&items[1], true).unwrap().is_match());
    assert!(!asn.add(&items[2], true).unwrap().is_match());
    assert!(!asn.add(&items[3], true).unwrap().is_match());

    assert_eq!(asn.members(), &items[..2]);
    let opt_elem = asn.constraints().get("opt_elem").unwrap();
    assert_eq!(opt_elem.value().as_deref(), Some("F200W"));
    assert_eq!(opt_elem.found_values().unwrap().len(), 1);
    assert!(opt_elem.found_values().unwrap().contains("F200W"));
}

#[test]
fn test_add_is_idempotent() {
    let rule = image_rule();
    let counter = SequenceCounter::new();
    let item = exposure("NIRCAM", "F200W").with_origin(0);

    let mut asn = create(&rule, &item, &counter);
    let before = asn.members().to_vec();

    let again = asn.add(&item, true).unwrap();
    assert!(again.is_match());
    assert!(again.reprocess.is_empty());
    assert_eq!(asn.members(), before.as_slice());
    assert!(asn.is_item_member(&item));
}

#[test]
fn test_failed_add_leaves_association_untouched() {
    let rule = image_rule();
    let counter = SequenceCounter::new();
    let mut asn = create(&rule, &exposure("NIRCAM", "F200W"), &counter);

    let before = asn.constraints().to_string();
    assert!(!asn.add(&exposure("NIRCAM", "F444W"), true).unwrap().is_match());
    assert_eq!(asn.constraints().to_string(), before);
    assert_eq!(asn.members().len(), 1);
}

#[test]
fn test_add_without_checking_constraints() {
    let rule = image_rule();
    let counter = SequenceCounter::new();
    let mut asn = create(&rule, &exposure("NIRCAM", "F200W"), &counter);

    let miri = exposure("MIRI", "F770W");
    assert!(asn.add(&miri, false).unwrap().is_match());
    assert!(asn.is_item_member(&miri));
    assert_eq!(
        asn.constraints().get("opt_elem").unwrap().value().as_deref(),
        Some("F200W")
    );
}

#[test]
fn test_order_sensitivity() {
    let a = exposure("NIRCAM", "F200W");
    let b = exposure("NIRCAM", "F444W");
    let rule = image_rule();

    let counter = SequenceCounter::new();
    let mut ab = create(&rule, &a, &counter);
    let b_joins = ab.add(&b, true).unwrap().is_match();

    let counter = SequenceCounter::new();
    let mut ba = create(&rule, &b, &counter);
    let a_joins = ba.add(&a, true).unwrap().is_match();

    assert!(!b_joins);
    assert!(!a_joins);
    assert_eq!(ab.members(), &[a.clone()]);
    assert_eq!(ba.members(), &[b.clone()]);
    assert_ne!(
        ab.constraints().get("opt_elem").unwrap().value(),
        ba.constraints().get("opt_elem").unwrap().value()
    );
}

#[test]
fn test_found_values_grow_monotonically() {
    let rule = Arc::new(Rule::new(
        "Asn_Detectors",
        ConstraintTree::all(vec![AttrConstraint::new(["detector"])
            .pattern("nrc.*")
            .force_unique(false)
            .named("detector")
            .into()]),
    ));
    let counter = SequenceCounter::new();
    let items = pool(
        ["nrca1", "nrcb1", "nrca1", "nrcb4"]
            .into_iter()
            .map(|d| Item::new().with("detector", d)),
    );

    let mut asn = create(&rule, &items[0], &counter);
    let mut previous = asn
        .constraints()
        .get("detector")
        .unwrap()
        .found_values()
        .unwrap()
        .clone();
    for item in &items[1..] {
        assert!(asn.add(item, true).unwrap().is_match());
        let current = asn
            .constraints()
            .get("detector")
            .unwrap()
            .found_values()
            .unwrap()
            .clone();
        assert!(current.is_superset(&previous));
        previous = current;
    }
    assert_eq!(previous.len(), 3);
    assert_eq!(asn.members().len(), 4);
}

#[test]
fn test_reprocess_restricted_to_own_rule() {
    let rule = Arc::new(Rule::new(
        "Asn_Candidate",
        ConstraintTree::all(vec![AttrConstraint::new(["asn_candidate"])
            .evaluate(true)
            .into()]),
    ));
    let counter = SequenceCounter::new();
    let item = Item::new().with("asn_candidate", "[o001, o002, c1000]");

    let (asn, reprocess) =
        Association::create(&rule, &item, WorkOver::Rules, &counter, None).unwrap();

    assert!(asn.is_none());
    assert_eq!(reprocess.len(), 1);
    assert_eq!(reprocess[0].rules, Some(vec!["Asn_Candidate".to_string()]));
    assert_eq!(reprocess[0].items.len(), 3);
}

#[derive(Default)]
struct CountingHooks {
    init_calls: AtomicUsize,
}

impl RuleHooks for CountingHooks {
    fn is_item_member(&self, members: &[Item], item: &Item) -> bool {
        members.contains(item)
    }

    fn init_hook(&self, asn: &mut Association, item: &Item) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        asn.set_meta("program", item.text("program").unwrap_or_default());
    }
}

#[test]
fn test_init_hook_runs_once() {
    let hooks = Arc::new(CountingHooks::default());

    struct Shared(Arc<CountingHooks>);
    impl RuleHooks for Shared {
        fn is_item_member(&self, members: &[Item], item: &Item) -> bool {
            self.0.is_item_member(members, item)
        }
        fn init_hook(&self, asn: &mut Association, item: &Item) {
            self.0.init_hook(asn, item)
        }
    }

    let rule = Arc::new(
        Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![SimpleConstraint::always().into()]),
        )
        .with_hooks(Shared(Arc::clone(&hooks))),
    );
    let counter = SequenceCounter::new();
    let items = nircam_miri_pool();

    let mut asn = create(&rule, &items[0], &counter);
    for item in &items[1..] {
        assert!(asn.add(item, true).unwrap().is_match());
    }

    assert_eq!(hooks.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(asn.meta().get("program").map(String::as_str), Some("01234"));
    assert_eq!(asn.members().len(), 4);
}

#[test]
fn test_init_hook_runs_before_numbering() {
    struct RecordSequence;
    impl RuleHooks for RecordSequence {
        fn is_item_member(&self, members: &[Item], item: &Item) -> bool {
            members.contains(item)
        }
        fn init_hook(&self, asn: &mut Association, _item: &Item) {
            let seen = asn.sequence().to_string();
            asn.set_meta("sequence_at_init", seen);
        }
    }

    let rule = Arc::new(
        Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![SimpleConstraint::always().into()]),
        )
        .with_hooks(RecordSequence),
    );
    let counter = SequenceCounter::new();
    let asn = create(&rule, &exposure("NIRCAM", "F200W"), &counter);

    assert_eq!(asn.meta().get("sequence_at_init").map(String::as_str), Some("0"));
    assert_eq!(asn.sequence(), 1);
}

#[test]
fn test_validity_tracks_members() {
    let rule = Arc::new(
        Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![AttrConstraint::new(["instrument"]).into()]),
        )
        .with_validity(ValidityCheck::attribute("has_science", "exp_type", "nrc_image").unwrap()),
    );
    let counter = SequenceCounter::new();

    let tacq = exposure("NIRCAM", "F200W").with_value("exp_type", "nrc_tacq");
    let mut asn = create(&rule, &tacq, &counter);
    assert!(!asn.is_valid());
    assert_eq!(asn.validity(), vec![("has_science", false)]);

    asn.add(&exposure("NIRCAM", "F200W"), true).unwrap();
    assert!(asn.is_valid());
    assert_eq!(asn.validity(), vec![("has_science", true)]);
}

#[test]
fn test_naming_reads_constraint_values() {
    let rule = Arc::new(
        Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![
                AttrConstraint::new(["filter"]).named("opt_elem").into(),
                AttrConstraint::new(["pupil"])
                    .required(false)
                    .named("opt_elem2")
                    .into(),
            ]),
        )
        .with_asn_type("image3")
        .with_naming(
            TemplateNaming::new("{type}_{opt_elem}{opt_elem2}_{version}_{sequence:03}")
                .unwrap()
                .lowercase(true),
        ),
    );
    let counter = SequenceCounter::new();

    let (asn, _) = Association::create(
        &rule,
        &exposure("NIRCAM", "F200W"),
        WorkOver::Rules,
        &counter,
        Some("V1"),
    )
    .unwrap();

    assert_eq!(asn.unwrap().name().unwrap(), "image3_f200w_v1_001");
}

#[test]
fn test_naming_unknown_constraint_fails() {
    let rule = Arc::new(
        Rule::new(
            "Asn_Image",
            ConstraintTree::all(vec![AttrConstraint::new(["filter"]).into()]),
        )
        .with_naming(TemplateNaming::new("{rule}_{target}").unwrap()),
    );
    assert!(rule.validate().is_err());

    let counter = SequenceCounter::new();
    let asn = create(&rule, &exposure("NIRCAM", "F200W"), &counter);
    assert!(matches!(
        asn.name(),
        Err(AsnError::ConstraintNotFound(name)) if name == "target"
    ));
}

#[test]
fn test_finalize_closes_association() {
    let rule = image_rule();
    let counter = SequenceCounter::new();
    let item = exposure("NIRCAM", "F200W");
    let mut asn = create(&rule, &item, &counter);

    let data = asn.finalize().unwrap();
    assert_eq!(data.asn_type, "Asn_Image");
    assert_eq!(data.asn_rule, "Asn_Image");
    assert_eq!(data.asn_id, "Asn_Image_001");
    assert_eq!(data.version_id, None);
    assert_eq!(data.code_version, CODE_VERSION);
    assert_eq!(data.members, vec![item]);
    assert_eq!(asn.state(), AsnState::Finalized);

    assert!(matches!(
        asn.add(&exposure("NIRCAM", "F200W"), true),
        Err(AsnError::InvalidState(_))
    ));
}
