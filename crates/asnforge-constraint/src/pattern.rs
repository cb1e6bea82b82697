//! Attribute value patterns.
//!
//! Patterns are regular expressions matched against the whole value,
//! ignoring case. A pattern `abc` behaves like `^(?:abc)$` with the `i`
//! flag: it matches `ABC` but not `xabcx`.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Produces a pattern at match time.
pub type PatternFn = Arc<dyn Fn() -> String + Send + Sync>;

/// A full-match, case-insensitive value pattern.
#[derive(Clone)]
pub enum Pattern {
    /// A compiled regular expression.
    Regex { source: String, regex: Regex },
    /// A value locked in by a previous match. `source` is the escaped form,
    /// compiled into `regex` like any configured pattern.
    Literal {
        source: String,
        value: String,
        regex: Regex,
    },
    /// A pattern computed when the constraint is checked.
    Dynamic(PatternFn),
    /// A regular expression that failed to compile.
    Invalid { source: String, error: String },
}

impl Pattern {
    /// Compiles a pattern.
    ///
    /// Compilation errors are kept in [`Pattern::Invalid`] and reported by
    /// constraint validation, so building a rule never panics.
    ///
    /// # Example
    ///
    /// ```
    /// use asnforge_constraint::Pattern;
    ///
    /// let pattern = Pattern::new("f2.*w");
    /// assert!(pattern.matches("F200W"));
    /// assert!(!pattern.matches("xf200w"));
    /// assert!(Pattern::new("(unclosed").error().is_some());
    /// ```
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        match compile(&source) {
            Ok(regex) => Pattern::Regex { source, regex },
            Err(err) => Pattern::Invalid {
                error: err.to_string(),
                source,
            },
        }
    }

    /// A pattern matching exactly `value`, ignoring case.
    pub fn literal(value: impl Into<String>) -> Self {
        let value = value.into();
        let source = regex::escape(&value);
        match compile(&source) {
            Ok(regex) => Pattern::Literal {
                source,
                value,
                regex,
            },
            Err(err) => Pattern::Invalid {
                error: err.to_string(),
                source,
            },
        }
    }

    /// A pattern computed by `f` each time it is matched.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Pattern::Dynamic(Arc::new(f))
    }

    /// Returns true if `value` matches the whole pattern.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Regex { regex, .. } | Pattern::Literal { regex, .. } => {
                regex.is_match(value)
            }
            Pattern::Dynamic(f) => {
                let source = f();
                match compile(&source) {
                    Ok(regex) => regex.is_match(value),
                    Err(err) => {
                        warn!(
                            event = "pattern_error",
                            pattern = %source,
                            error = %err,
                            "dynamic pattern failed to compile; treating as no match"
                        );
                        false
                    }
                }
            }
            Pattern::Invalid { .. } => false,
        }
    }

    /// The pattern text. Dynamic patterns are evaluated.
    pub fn source(&self) -> String {
        match self {
            Pattern::Regex { source, .. }
            | Pattern::Literal { source, .. }
            | Pattern::Invalid { source, .. } => source.clone(),
            Pattern::Dynamic(f) => f(),
        }
    }

    /// The unescaped value of a locked pattern.
    pub fn locked_value(&self) -> Option<&str> {
        match self {
            Pattern::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The compilation error, if the pattern is invalid.
    pub fn error(&self) -> Option<&str> {
        match self {
            Pattern::Invalid { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex { source, .. } => f.debug_tuple("Regex").field(source).finish(),
            Pattern::Literal { value, .. } => f.debug_tuple("Literal").field(value).finish(),
            Pattern::Dynamic(_) => f.write_str("Dynamic(..)"),
            Pattern::Invalid { source, error } => f
                .debug_struct("Invalid")
                .field("source", source)
                .field("error", error)
                .finish(),
        }
    }
}

fn compile(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{})$", source))
        .case_insensitive(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_only() {
        let pattern = Pattern::new("abc");
        assert!(pattern.matches("abc"));
        assert!(pattern.matches("ABC"));
        assert!(!pattern.matches("xabcx"));
        assert!(!pattern.matches("abcx"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let pattern = Pattern::new("mir_lrs-fixedslit|mir_tacq");
        assert!(pattern.matches("MIR_TACQ"));
        assert!(!pattern.matches("mir_tacq_extra"));
        assert!(!pattern.matches("xmir_lrs-fixedslit"));
    }

    #[test]
    fn test_literal_escapes_source() {
        let pattern = Pattern::literal("f1.0+w");
        assert_eq!(pattern.source(), r"f1\.0\+w");
        assert_eq!(pattern.locked_value(), Some("f1.0+w"));
        assert!(pattern.matches("F1.0+W"));
        assert!(!pattern.matches("f100w"));
    }

    #[test]
    fn test_literal_folds_case_like_configured_patterns() {
        let locked = Pattern::literal("σ");
        let configured = Pattern::new(regex::escape("σ"));

        for value in ["σ", "Σ", "ς"] {
            assert_eq!(locked.matches(value), configured.matches(value), "{}", value);
            assert!(locked.matches(value), "{}", value);
        }
    }

    #[test]
    fn test_dynamic_pattern() {
        let pattern = Pattern::dynamic(|| "o0+1".to_string());
        assert!(pattern.matches("o001"));
        assert!(!pattern.matches("o002"));
    }

    #[test]
    fn test_broken_dynamic_pattern_never_matches() {
        let pattern = Pattern::dynamic(|| "(".to_string());
        assert!(!pattern.matches("("));
    }

    #[test]
    fn test_invalid_pattern() {
        let pattern = Pattern::new("[a-");
        assert!(pattern.error().is_some());
        assert!(!pattern.matches("[a-"));
        assert_eq!(pattern.source(), "[a-");
    }
}
