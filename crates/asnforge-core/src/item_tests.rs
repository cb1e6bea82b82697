//! Tests for pool items.

use crate::invalid::InvalidValues;
use crate::item::{Item, ItemValue};

fn exposure() -> Item {
    Item::new()
        .with("instrument", "nircam")
        .with("filter", "NULL")
        .with("pupil", "clear")
        .with("asn_candidate", "[o001, c1000]")
}

#[test]
fn test_first_valid_skips_invalid() {
    let item = exposure();
    let invalid = InvalidValues::common();

    let found = item.first_valid(&["filter", "pupil"], &invalid);
    assert_eq!(found, Some(("pupil", &ItemValue::from("clear"))));
}

#[test]
fn test_first_valid_respects_order() {
    let item = exposure();
    let found = item.first_valid(&["pupil", "instrument"], &InvalidValues::new());
    assert_eq!(found.map(|(source, _)| source), Some("pupil"));
}

#[test]
fn test_first_valid_missing() {
    let item = exposure();
    let invalid = InvalidValues::common();
    assert_eq!(item.first_valid(&["filter", "detector"], &invalid), None);
}

#[test]
fn test_without_sentinels_marker_is_a_value() {
    let item = exposure();
    let found = item.first_valid(&["filter"], &InvalidValues::new());
    assert_eq!(found, Some(("filter", &ItemValue::from("NULL"))));
}

#[test]
fn test_with_value_leaves_original() {
    let item = exposure().with_origin(3);
    let copy = item.with_value("asn_candidate", "o001");

    assert_eq!(item.text("asn_candidate"), Some("[o001, c1000]"));
    assert_eq!(copy.text("asn_candidate"), Some("o001"));
    assert_eq!(copy.origin(), Some(3));
    assert_ne!(item, copy);
}

#[test]
fn test_origin_distinguishes_equal_rows() {
    let a = exposure().with_origin(0);
    let b = exposure().with_origin(1);
    assert_ne!(a, b);
    assert_eq!(a, exposure().with_origin(0));
}

#[test]
fn test_display_is_key_ordered() {
    let item: Item = [("b", "2"), ("a", "1")].into_iter().collect();
    assert_eq!(item.to_string(), "{a: 1, b: 2}");
}

#[test]
fn test_list_display() {
    let item = Item::new().with("k", vec!["x", "y"]);
    assert_eq!(item.to_string(), "{k: ['x', 'y']}");
    assert!(item.get("k").is_some_and(ItemValue::is_list));
    assert_eq!(item.text("k"), None);
}

#[test]
fn test_expanded_value_is_marked() {
    let item = exposure().with_origin(2);
    let copy = item.with_expanded_value("asn_candidate", "[o001, o002]");

    assert!(copy.is_expanded("asn_candidate"));
    assert!(!copy.is_expanded("filter"));
    assert!(!item.is_expanded("asn_candidate"));
    assert_eq!(copy.origin(), Some(2));
    assert!(copy.with_value("pupil", "f405n").is_expanded("asn_candidate"));
}
