//! Association naming strategies.

use std::fmt::Write;

use asnforge_core::{AsnError, Result};

use crate::association::Association;

/// Produces an association's name.
pub trait NamingStrategy: Send + Sync {
    /// Names `asn`.
    ///
    /// # Errors
    ///
    /// Propagates [`AsnError::ConstraintNotFound`] when the name refers to
    /// a constraint the association's tree does not have.
    fn name(&self, asn: &Association) -> Result<String>;

    /// Constraint names this strategy reads, checked when a rule is built.
    fn referenced_constraints(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl<F> NamingStrategy for F
where
    F: Fn(&Association) -> Result<String> + Send + Sync,
{
    fn name(&self, asn: &Association) -> Result<String> {
        self(asn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field { name: String, width: usize },
}

/// Names built from a `{placeholder}` template.
///
/// Placeholders:
/// - `{type}`: the association type
/// - `{rule}`: the rule name
/// - `{sequence}`: the sequence number; `{sequence:03}` zero-pads to 3 digits
/// - `{version}`: the version id, empty if none
/// - `{<name>}`: the value of the named constraint, empty if unbound
///
/// # Example
///
/// ```
/// use asnforge_engine::TemplateNaming;
///
/// let naming = TemplateNaming::new("{rule}_{sequence:03}_{opt_elem}").unwrap();
/// assert_eq!(naming.fields(), vec!["rule", "sequence", "opt_elem"]);
/// assert!(TemplateNaming::new("{rule").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNaming {
    template: String,
    segments: Vec<Segment>,
    lowercase: bool,
}

const BUILTIN_FIELDS: [&str; 4] = ["type", "rule", "sequence", "version"];

impl Default for TemplateNaming {
    fn default() -> Self {
        Self {
            template: "{rule}_{sequence:03}".to_string(),
            segments: vec![
                Segment::Field {
                    name: "rule".to_string(),
                    width: 0,
                },
                Segment::Text("_".to_string()),
                Segment::Field {
                    name: "sequence".to_string(),
                    width: 3,
                },
            ],
            lowercase: false,
        }
    }
}

impl TemplateNaming {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`AsnError::Config`] for unbalanced braces, empty
    /// placeholders or a bad width.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let segments = parse(&template)?;
        Ok(Self {
            template,
            segments,
            lowercase: false,
        })
    }

    /// Lower-cases the produced names.
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names, in order.
    pub fn fields(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field { name, .. } => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }
}

impl NamingStrategy for TemplateNaming {
    fn name(&self, asn: &Association) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field { name, width } => match name.as_str() {
                    "type" => out.push_str(asn.asn_type()),
                    "rule" => out.push_str(asn.rule_name()),
                    "sequence" => {
                        let _ = write!(out, "{:0width$}", asn.sequence(), width = *width);
                    }
                    "version" => out.push_str(asn.version_id().unwrap_or_default()),
                    constraint => {
                        if let Some(value) = asn.constraints().get(constraint)?.value() {
                            out.push_str(&value);
                        }
                    }
                },
            }
        }
        if self.lowercase {
            out = out.to_lowercase();
        }
        Ok(out)
    }

    fn referenced_constraints(&self) -> Vec<&str> {
        self.fields()
            .into_iter()
            .filter(|field| !BUILTIN_FIELDS.contains(field))
            .collect()
    }
}

fn parse(template: &str) -> Result<Vec<Segment>> {
    let invalid = |reason: &str| {
        AsnError::Config(format!("invalid name template '{}': {}", template, reason))
    };

    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(invalid("unmatched '}'"));
        }
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
        let field = &after[..close];
        if field.contains('{') {
            return Err(invalid("nested '{'"));
        }

        let (name, spec) = match field.split_once(':') {
            Some((name, spec)) => (name.trim(), Some(spec.trim())),
            None => (field.trim(), None),
        };
        if name.is_empty() {
            return Err(invalid("empty placeholder"));
        }
        let width = match spec {
            Some(spec) => spec
                .parse::<usize>()
                .map_err(|_| invalid("width must be a number"))?,
            None => 0,
        };

        segments.push(Segment::Field {
            name: name.to_string(),
            width,
        });
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let segments = parse("jw{program}-{sequence:03}_asn").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Text("jw".into()),
                Segment::Field {
                    name: "program".into(),
                    width: 0
                },
                Segment::Text("-".into()),
                Segment::Field {
                    name: "sequence".into(),
                    width: 3
                },
                Segment::Text("_asn".into()),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("{rule").is_err());
        assert!(parse("rule}").is_err());
        assert!(parse("{}").is_err());
        assert!(parse("{sequence:abc}").is_err());
        assert!(parse("{a{b}}").is_err());
    }

    #[test]
    fn test_referenced_constraints_skip_builtins() {
        let naming = TemplateNaming::new("{type}_{rule}_{version}_{sequence}_{opt_elem}").unwrap();
        assert_eq!(naming.referenced_constraints(), vec!["opt_elem"]);
    }

    #[test]
    fn test_default_template() {
        let naming = TemplateNaming::default();
        assert_eq!(naming, TemplateNaming::new("{rule}_{sequence:03}").unwrap());
    }
}
