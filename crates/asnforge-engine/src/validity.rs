//! Degraded-status tracking.
//!
//! A rule may require that at least one member of an association has some
//! property, for example that it contains a science exposure and not only
//! target acquisitions. Each requirement is a [`ValidityCheck`]; an
//! association is valid once every check has been satisfied by some member.

use std::fmt;
use std::sync::Arc;

use asnforge_constraint::{ItemPredicate, Pattern};
use asnforge_core::{AsnError, Item, Result};

/// One condition some member must satisfy.
#[derive(Clone)]
pub struct ValidityCheck {
    name: String,
    predicate: ItemPredicate,
}

impl ValidityCheck {
    /// Creates a check from a predicate.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Item) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// A check satisfied by members whose `attribute` fully matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`AsnError::MalformedRule`] if the pattern does not compile.
    ///
    /// # Example
    ///
    /// ```
    /// use asnforge_core::Item;
    /// use asnforge_engine::ValidityCheck;
    ///
    /// let check = ValidityCheck::attribute("has_science", "exp_type", "nrc_image|nrc_wfss").unwrap();
    /// assert!(check.is_satisfied_by(&Item::new().with("exp_type", "NRC_IMAGE")));
    /// assert!(!check.is_satisfied_by(&Item::new().with("exp_type", "nrc_taconfirm")));
    /// ```
    pub fn attribute(
        name: impl Into<String>,
        attribute: impl Into<String>,
        pattern: &str,
    ) -> Result<Self> {
        let name = name.into();
        let compiled = Pattern::new(pattern);
        if let Some(error) = compiled.error() {
            return Err(AsnError::malformed(
                &name,
                format!("validity pattern '{}' is invalid: {}", pattern, error),
            ));
        }
        let attribute = attribute.into();
        Ok(Self::new(name, move |item: &Item| {
            item.text(&attribute)
                .is_some_and(|value| compiled.matches(value))
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `item` satisfies this check.
    pub fn is_satisfied_by(&self, item: &Item) -> bool {
        (self.predicate)(item)
    }
}

impl fmt::Debug for ValidityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidityCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
