//! The set of mapping keys whose values are sealed.

use std::collections::BTreeSet;

/// Key names encrypted by default, wherever they appear in a document.
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &["password", "vnc_password"];

/// Exact, case-sensitive set of mapping keys that mark a value as secret.
///
/// Membership is by key name only, never by path: a `password` inside a list of
/// accounts is as sensitive as one at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveFields {
    names: BTreeSet<String>,
}

impl SensitiveFields {
    /// Build a set from arbitrary names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if `key` names a sensitive field.
    pub fn contains(&self, key: &str) -> bool {
        self.names.contains(key)
    }

    /// Iterate the names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for SensitiveFields {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS.iter().copied())
    }
}
