//! Configuration system for asnforge.
//!
//! Load engine settings and declarative association rules from TOML or YAML
//! files, so rule sets can change without recompiling.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use asnforge_config::{ConstraintConfig, EngineConfig};
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     worklist_limit = 10000
//!
//!     [[rules]]
//!     name = "Asn_Image"
//!     asn_type = "image3"
//!     name_template = "{rule}_{sequence:03}_{opt_elem}"
//!
//!     [rules.constraints]
//!     type = "tree"
//!     reduce = "all"
//!
//!     [[rules.constraints.children]]
//!     type = "attr"
//!     sources = ["instrument"]
//!     value = "nircam"
//!
//!     [[rules.constraints.children]]
//!     type = "attr"
//!     name = "opt_elem"
//!     sources = ["filter"]
//! "#).unwrap();
//!
//! assert_eq!(config.worklist_limit, Some(10000));
//! assert_eq!(config.rules.len(), 1);
//! assert!(matches!(config.rules[0].constraints, ConstraintConfig::Tree(_)));
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use asnforge_config::EngineConfig;
//!
//! let config = EngineConfig::load("asnforge.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::collections::HashSet;
use std::path::Path;

use asnforge_core::{InvalidValues, WorkOver};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for asnforge_core::AsnError {
    fn from(err: ConfigError) -> Self {
        asnforge_core::AsnError::Config(err.to_string())
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Strings treated as a missing attribute value.
    #[serde(default = "default_invalid_values")]
    pub invalid_values: Vec<String>,

    /// How association version ids are produced.
    #[serde(default)]
    pub version_id: VersionIdConfig,

    /// Scope pool items are first offered over.
    #[serde(default)]
    pub seed_scope: ScopeConfig,

    /// Maximum number of process lists handled in one run.
    #[serde(default)]
    pub worklist_limit: Option<usize>,

    /// Association rules, in registration order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_invalid_values() -> Vec<String> {
    InvalidValues::common().iter().map(str::to_string).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            invalid_values: default_invalid_values(),
            version_id: VersionIdConfig::default(),
            seed_scope: ScopeConfig::default(),
            worklist_limit: None,
            rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, as YAML for `.yaml`/`.yml`
    /// extensions and as TOML otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks rule names. Constraint trees are checked when the engine
    /// builds its registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::Invalid("rule with an empty name".to_string()));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "rule '{}' is defined more than once",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Adds an invalid-value marker.
    pub fn with_invalid_value(mut self, value: impl Into<String>) -> Self {
        self.invalid_values.push(value.into());
        self
    }

    /// Sets the version id policy.
    pub fn with_version_id(mut self, version_id: VersionIdConfig) -> Self {
        self.version_id = version_id;
        self
    }

    /// Sets the seed scope.
    pub fn with_seed_scope(mut self, scope: ScopeConfig) -> Self {
        self.seed_scope = scope;
        self
    }

    /// Sets the worklist limit.
    pub fn with_worklist_limit(mut self, limit: usize) -> Self {
        self.worklist_limit = Some(limit);
        self
    }

    /// Adds a rule.
    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.rules.push(rule);
        self
    }

    /// The configured markers as an [`InvalidValues`] set.
    pub fn invalid_values(&self) -> InvalidValues {
        self.invalid_values.iter().cloned().collect()
    }
}

/// Version id policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VersionIdConfig {
    /// No version id.
    #[default]
    None,

    /// A UTC timestamp taken when the registry is built.
    Timestamp,

    /// A fixed string.
    Literal { value: String },
}

/// Work-over scope as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeConfig {
    #[default]
    Both,
    Existing,
    Rules,
}

impl From<ScopeConfig> for WorkOver {
    fn from(scope: ScopeConfig) -> Self {
        match scope {
            ScopeConfig::Both => WorkOver::Both,
            ScopeConfig::Existing => WorkOver::Existing,
            ScopeConfig::Rules => WorkOver::Rules,
        }
    }
}

/// One association rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
    /// Rule name, unique within the registry.
    pub name: String,

    /// Association type written to products. Defaults to the rule name.
    #[serde(default)]
    pub asn_type: Option<String>,

    /// Template for association names, e.g. `"{rule}_{sequence:03}"`.
    #[serde(default)]
    pub name_template: Option<String>,

    /// Attributes identifying a member. Empty means whole-item equality.
    #[serde(default)]
    pub member_keys: Vec<String>,

    /// Conditions some member must satisfy for the association to be valid.
    #[serde(default)]
    pub validity: Vec<ValidityConfig>,

    /// Membership criteria.
    pub constraints: ConstraintConfig,
}

impl RuleConfig {
    /// Creates a rule with the given constraints.
    pub fn new(name: impl Into<String>, constraints: ConstraintConfig) -> Self {
        Self {
            name: name.into(),
            asn_type: None,
            name_template: None,
            member_keys: Vec::new(),
            validity: Vec::new(),
            constraints,
        }
    }

    /// Sets the association type.
    pub fn with_asn_type(mut self, asn_type: impl Into<String>) -> Self {
        self.asn_type = Some(asn_type.into());
        self
    }

    /// Sets the name template.
    pub fn with_name_template(mut self, template: impl Into<String>) -> Self {
        self.name_template = Some(template.into());
        self
    }

    /// Adds a member identity key.
    pub fn with_member_key(mut self, key: impl Into<String>) -> Self {
        self.member_keys.push(key.into());
        self
    }

    /// Adds a validity condition.
    pub fn with_validity(mut self, validity: ValidityConfig) -> Self {
        self.validity.push(validity);
        self
    }

    /// The association type, falling back to the rule name.
    pub fn asn_type(&self) -> &str {
        self.asn_type.as_deref().unwrap_or(&self.name)
    }
}

/// A validity condition: some member's `attribute` must match `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ValidityConfig {
    pub name: String,
    pub attribute: String,
    pub pattern: String,
}

/// A constraint node.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintConfig {
    /// Attribute constraint.
    Attr(AttrConfig),

    /// Constraint tree.
    Tree(TreeConfig),
}

/// Attribute constraint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AttrConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Candidate attribute names, in lookup order.
    pub sources: Vec<String>,

    /// Value pattern (regular expression).
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default)]
    pub evaluate: bool,

    #[serde(default = "default_true")]
    pub force_unique: bool,

    #[serde(default)]
    pub force_undefined: bool,

    #[serde(default)]
    pub force_reprocess: Option<ScopeConfig>,

    #[serde(default)]
    pub only_on_match: bool,

    /// Gate on the item: when it does not hold, the constraint is skipped
    /// and `force_reprocess` applies.
    #[serde(default)]
    pub onlyif: Option<OnlyIfConfig>,
}

/// Item condition: `attribute` must be present and match `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OnlyIfConfig {
    pub attribute: String,
    pub pattern: String,
}

impl OnlyIfConfig {
    pub fn new(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            pattern: pattern.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl AttrConfig {
    /// Creates a required, force-unique attribute constraint.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            sources: sources.into_iter().map(Into::into).collect(),
            value: None,
            required: true,
            evaluate: false,
            force_unique: true,
            force_undefined: false,
            force_reprocess: None,
            only_on_match: false,
            onlyif: None,
        }
    }

    /// Sets the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the value pattern.
    pub fn value(mut self, pattern: impl Into<String>) -> Self {
        self.value = Some(pattern.into());
        self
    }

    /// Only applies to items whose `attribute` matches `pattern`; others
    /// are re-queued over `scope`.
    pub fn onlyif(mut self, onlyif: OnlyIfConfig, scope: ScopeConfig) -> Self {
        self.onlyif = Some(onlyif);
        self.force_reprocess = Some(scope);
        self
    }
}

/// Constraint tree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TreeConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// `"all"` or `"any"`.
    #[serde(default = "default_reduce")]
    pub reduce: String,

    #[serde(default)]
    pub work_over: ScopeConfig,

    #[serde(default)]
    pub children: Vec<ConstraintConfig>,
}

fn default_reduce() -> String {
    "all".to_string()
}

impl TreeConfig {
    /// Creates a tree with the given reduction.
    pub fn new(reduce: impl Into<String>, children: Vec<ConstraintConfig>) -> Self {
        Self {
            name: None,
            reduce: reduce.into(),
            work_over: ScopeConfig::default(),
            children,
        }
    }

    /// Sets the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<AttrConfig> for ConstraintConfig {
    fn from(c: AttrConfig) -> Self {
        ConstraintConfig::Attr(c)
    }
}

impl From<TreeConfig> for ConstraintConfig {
    fn from(c: TreeConfig) -> Self {
        ConstraintConfig::Tree(c)
    }
}

#[cfg(test)]
mod tests;
