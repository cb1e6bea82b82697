//! Tests for engine configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        invalid_values = ["", "NULL"]
        seed_scope = "rules"
        worklist_limit = 500

        [version_id]
        type = "literal"
        value = "20260101t000000"

        [[rules]]
        name = "Asn_Image"
        member_keys = ["expname"]

        [[rules.validity]]
        name = "has_science"
        attribute = "exp_type"
        pattern = "nrc_image"

        [rules.constraints]
        type = "tree"
        reduce = "any"
        work_over = "existing"

        [[rules.constraints.children]]
        type = "attr"
        name = "opt_elem"
        sources = ["filter"]
        evaluate = true
        force_reprocess = "rules"

        [rules.constraints.children.onlyif]
        attribute = "exp_type"
        pattern = "nrc_image|nrc_wfss"
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.invalid_values, vec!["", "NULL"]);
    assert_eq!(config.seed_scope, ScopeConfig::Rules);
    assert_eq!(config.worklist_limit, Some(500));
    assert_eq!(
        config.version_id,
        VersionIdConfig::Literal {
            value: "20260101t000000".into()
        }
    );

    let rule = &config.rules[0];
    assert_eq!(rule.asn_type(), "Asn_Image");
    assert_eq!(rule.member_keys, vec!["expname"]);
    assert_eq!(rule.validity[0].attribute, "exp_type");

    let ConstraintConfig::Tree(tree) = &rule.constraints else {
        panic!("expected a tree");
    };
    assert_eq!(tree.reduce, "any");
    assert_eq!(tree.work_over, ScopeConfig::Existing);
    let ConstraintConfig::Attr(attr) = &tree.children[0] else {
        panic!("expected an attribute constraint");
    };
    assert!(attr.required);
    assert!(attr.force_unique);
    assert!(attr.evaluate);
    assert_eq!(attr.force_reprocess, Some(ScopeConfig::Rules));
    assert_eq!(
        attr.onlyif,
        Some(OnlyIfConfig::new("exp_type", "nrc_image|nrc_wfss"))
    );
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        version_id:
          type: timestamp
        rules:
          - name: Asn_Image
            asn_type: image3
            name_template: "{rule}_{sequence:03}"
            constraints:
              type: tree
              children:
                - type: attr
                  sources: [instrument]
                  value: nircam
                - type: attr
                  name: opt_elem
                  sources: [filter]
                  required: false
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.version_id, VersionIdConfig::Timestamp);
    assert_eq!(config.seed_scope, ScopeConfig::Both);
    assert_eq!(config.invalid_values().len(), 5);

    let rule = &config.rules[0];
    assert_eq!(rule.asn_type(), "image3");
    let ConstraintConfig::Tree(tree) = &rule.constraints else {
        panic!("expected a tree");
    };
    assert_eq!(tree.reduce, "all");
    assert_eq!(tree.children.len(), 2);
}

#[test]
fn test_duplicate_rule_names_rejected() {
    let toml = r#"
        [[rules]]
        name = "Asn_Image"
        [rules.constraints]
        type = "attr"
        sources = ["filter"]

        [[rules]]
        name = "Asn_Image"
        [rules.constraints]
        type = "attr"
        sources = ["pupil"]
    "#;

    assert!(matches!(
        EngineConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        EngineConfig::load("/nonexistent/asnforge.toml"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_builder() {
    let config = EngineConfig::new()
        .with_invalid_value("UNKNOWN")
        .with_worklist_limit(100)
        .with_seed_scope(ScopeConfig::Rules)
        .with_rule(
            RuleConfig::new(
                "Asn_Image",
                TreeConfig::new(
                    "all",
                    vec![AttrConfig::new(["filter"]).named("opt_elem").into()],
                )
                .into(),
            )
            .with_asn_type("image3"),
        );

    assert!(config.invalid_values().contains("UNKNOWN"));
    assert!(config.invalid_values().contains("NULL"));
    assert_eq!(config.worklist_limit, Some(100));
    assert_eq!(config.rules[0].asn_type(), "image3");
    assert!(config.validate().is_ok());
    assert_eq!(WorkOver::from(config.seed_scope), WorkOver::Rules);
}
