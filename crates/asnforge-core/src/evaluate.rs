//! Evaluation of possibly multi-valued attribute values.
//!
//! Pools encode ambiguous attributes, such as the list of candidates an
//! exposure belongs to, as a bracketed list inside a single cell:
//!
//! ```text
//! [('o001', 'observation'), ('c1000', 'mosaic')]
//! ```
//!
//! [`evaluate`] splits such a cell into its elements. Only the outermost
//! brackets count: elements keep their own nesting. An element may itself
//! look like a list (`[[a, b], c]`); callers mark expanded attributes with
//! [`Item::with_expanded_value`](crate::Item::with_expanded_value) so such
//! an element is not split a second time.

use crate::item::ItemValue;

/// Result of evaluating an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    /// A single value.
    Single(String),
    /// A list of values, in their original order.
    Multiple(Vec<String>),
}

/// Evaluates an attribute value.
///
/// # Example
///
/// ```
/// use asnforge_core::{evaluate, Evaluated, ItemValue};
///
/// let value = ItemValue::from("['o001', \"o002\", o003]");
/// assert_eq!(
///     evaluate(&value),
///     Evaluated::Multiple(vec!["o001".into(), "o002".into(), "o003".into()])
/// );
///
/// let single = ItemValue::from("o001");
/// assert_eq!(evaluate(&single), Evaluated::Single("o001".into()));
/// ```
pub fn evaluate(value: &ItemValue) -> Evaluated {
    match value {
        ItemValue::List(values) => Evaluated::Multiple(values.clone()),
        ItemValue::Text(text) => match split_list(text) {
            Some(values) => Evaluated::Multiple(values),
            None => Evaluated::Single(text.clone()),
        },
    }
}

// Splits `[a, b, c]` at top-level commas. Returns None if `text` is not a list.
fn split_list(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;

    let mut values = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in inner.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                current.push(ch);
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    current.push(ch);
                }
                ',' if depth == 0 => {
                    values.push(unquote(&current));
                    current.clear();
                }
                _ => current.push(ch),
            },
        }
    }

    let last = current.trim();
    if !last.is_empty() || !values.is_empty() {
        values.push(unquote(last));
    }

    Some(values)
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    for q in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
