//! Registry construction from configuration.

use asnforge_config::{ConstraintConfig, EngineConfig, RuleConfig, VersionIdConfig};
use asnforge_constraint::{AttrConstraint, Constraint, ConstraintTree, Pattern, Reduce};
use asnforge_core::{AsnError, InvalidValues, Result, WorkOver};
use chrono::Utc;
use tracing::debug;

use crate::members::KeyedMembers;
use crate::naming::TemplateNaming;
use crate::registry::Registry;
use crate::rule::Rule;
use crate::validity::ValidityCheck;

/// Format of timestamp version ids.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dt%H%M%S";

impl Registry {
    /// Builds a registry from the rules of an engine configuration.
    ///
    /// # Errors
    ///
    /// - [`AsnError::NoRules`] if the configuration has no rules
    /// - [`AsnError::MalformedRule`] for unknown reductions, invalid
    ///   patterns, bad name templates or templates naming a constraint the
    ///   rule does not define
    ///
    /// # Example
    ///
    /// ```
    /// use asnforge_config::EngineConfig;
    /// use asnforge_engine::Registry;
    ///
    /// let config = EngineConfig::from_yaml_str(r#"
    ///     rules:
    ///       - name: Asn_Image
    ///         constraints:
    ///           type: attr
    ///           sources: [filter]
    /// "#).unwrap();
    ///
    /// let registry = Registry::from_config(&config).unwrap();
    /// assert_eq!(registry.rule_names(), vec!["Asn_Image"]);
    /// ```
    pub fn from_config(config: &EngineConfig) -> Result<Registry> {
        let invalid = config.invalid_values();
        let mut builder = Registry::builder();
        if let Some(version_id) = version_id(&config.version_id) {
            builder = builder.version_id(version_id);
        }
        for rule in &config.rules {
            builder = builder.register(build_rule(rule, &invalid)?);
        }
        builder.build()
    }
}

/// Resolves a version id policy.
pub fn version_id(config: &VersionIdConfig) -> Option<String> {
    match config {
        VersionIdConfig::None => None,
        VersionIdConfig::Timestamp => Some(Utc::now().format(TIMESTAMP_FORMAT).to_string()),
        VersionIdConfig::Literal { value } => Some(value.clone()),
    }
}

/// Builds one rule prototype.
pub fn build_rule(config: &RuleConfig, invalid: &InvalidValues) -> Result<Rule> {
    let name = config.name.as_str();
    let constraints = match build_constraint(&config.constraints, invalid, name)? {
        Constraint::Tree(tree) => tree,
        leaf => ConstraintTree::all(vec![leaf]),
    };

    let mut rule = Rule::new(name, constraints).with_asn_type(config.asn_type());

    if let Some(template) = &config.name_template {
        let naming = TemplateNaming::new(template.as_str())
            .map_err(|err| AsnError::malformed(name, err.to_string()))?;
        rule = rule.with_naming(naming);
    }
    if !config.member_keys.is_empty() {
        rule = rule.with_hooks(KeyedMembers::new(config.member_keys.iter().cloned()));
    }
    for validity in &config.validity {
        rule = rule.with_validity(ValidityCheck::attribute(
            validity.name.as_str(),
            validity.attribute.as_str(),
            &validity.pattern,
        )?);
    }

    debug!(event = "rule_built", rule = name, asn_type = rule.asn_type());
    Ok(rule)
}

fn build_constraint(
    config: &ConstraintConfig,
    invalid: &InvalidValues,
    rule: &str,
) -> Result<Constraint> {
    match config {
        ConstraintConfig::Attr(attr) => {
            let mut c = AttrConstraint::new(attr.sources.iter().cloned())
                .invalid_values(invalid.clone())
                .required(attr.required)
                .evaluate(attr.evaluate)
                .force_unique(attr.force_unique)
                .force_undefined(attr.force_undefined)
                .only_on_match(attr.only_on_match);
            if let Some(name) = &attr.name {
                c = c.named(name.as_str());
            }
            if let Some(pattern) = &attr.value {
                c = c.pattern(pattern.as_str());
            }
            if let Some(scope) = attr.force_reprocess {
                c = c.force_reprocess(WorkOver::from(scope));
            }
            if let Some(onlyif) = &attr.onlyif {
                let pattern = Pattern::new(onlyif.pattern.as_str());
                if let Some(error) = pattern.error() {
                    return Err(AsnError::malformed(
                        rule,
                        format!("onlyif pattern '{}' is invalid: {}", onlyif.pattern, error),
                    ));
                }
                let attribute = onlyif.attribute.clone();
                c = c.onlyif(move |item| {
                    item.text(&attribute)
                        .is_some_and(|value| pattern.matches(value))
                });
            }
            Ok(c.into())
        }
        ConstraintConfig::Tree(tree) => {
            let reduce: Reduce = tree
                .reduce
                .parse()
                .map_err(|_: AsnError| {
                    AsnError::malformed(rule, format!("unknown reduction '{}'", tree.reduce))
                })?;
            let children = tree
                .children
                .iter()
                .map(|child| build_constraint(child, invalid, rule))
                .collect::<Result<Vec<_>>>()?;
            let mut built =
                ConstraintTree::new(reduce, children).with_work_over(tree.work_over.into());
            if let Some(name) = &tree.name {
                built = built.named(name.as_str());
            }
            Ok(built.into())
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
