//! Container format: the reserved root entry that marks a document as encrypted.
//!
//! ```yaml
//! _encryption:
//!   version: 1
//!   salt: <base64url(16 random bytes)>
//! ```
//!
//! Presence of [`METADATA_KEY`] at the document root is the only signal that a
//! document is encrypted. The entry is never passed through the value cipher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SealError;

/// Root key holding the container metadata.
pub const METADATA_KEY: &str = "_encryption";

/// The only container version this build reads or writes.
pub const FORMAT_VERSION: u64 = 1;

/// Prefix of every encrypted value token.
pub const TOKEN_PREFIX: &str = "ENC[";

/// Suffix of every encrypted value token.
pub const TOKEN_SUFFIX: &str = "]";

/// Parsed form of the `_encryption` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionMeta {
    /// Container format version.
    pub version: u64,
    /// Base64url-encoded key-derivation salt.
    pub salt: String,
}

impl EncryptionMeta {
    /// Metadata for a freshly encrypted document at the current version.
    pub fn current(salt: String) -> Self {
        Self {
            version: FORMAT_VERSION,
            salt,
        }
    }

    /// Render as the value stored under [`METADATA_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Encryption`] if serialisation fails.
    pub fn to_value(&self) -> Result<Value, SealError> {
        serde_json::to_value(self).map_err(|_| SealError::Encryption)
    }

    /// Parse the value stored under [`METADATA_KEY`].
    ///
    /// # Errors
    ///
    /// - [`SealError::MalformedDocument`] if the entry is not a mapping, the
    ///   version is missing or not an integer, the salt is missing, empty or not
    ///   a string, or any other key is present.
    /// - [`SealError::UnsupportedVersion`] if the version is an integer other
    ///   than [`FORMAT_VERSION`], negative ones included.
    pub fn from_value(value: &Value) -> Result<Self, SealError> {
        let map = value
            .as_object()
            .ok_or_else(|| SealError::malformed(format!("{METADATA_KEY} must be a mapping")))?;

        let version = map
            .get("version")
            .filter(|v| v.is_i64() || v.is_u64())
            .ok_or_else(|| {
                SealError::malformed(format!("{METADATA_KEY}.version must be an integer"))
            })?;
        if version.as_u64() != Some(FORMAT_VERSION) {
            return Err(SealError::UnsupportedVersion(version.to_string()));
        }

        let meta = Self::deserialize(value)
            .map_err(|e| SealError::malformed(format!("{METADATA_KEY}: {e}")))?;
        if meta.salt.is_empty() {
            return Err(SealError::malformed(format!("{METADATA_KEY}.salt is empty")));
        }
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_uses_format_version() {
        let meta = EncryptionMeta::current("c2FsdA==".into());
        assert_eq!(meta.version, 1);
        assert_eq!(
            meta.to_value().unwrap(),
            json!({"version": 1, "salt": "c2FsdA=="})
        );
    }

    #[test]
    fn parses_valid_metadata() {
        let meta = EncryptionMeta::from_value(&json!({"version": 1, "salt": "abc"})).unwrap();
        assert_eq!(meta, EncryptionMeta::current("abc".into()));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = EncryptionMeta::from_value(&json!({"version": 2, "salt": "abc"})).unwrap_err();
        assert_eq!(err, SealError::UnsupportedVersion("2".into()));
    }

    #[test]
    fn negative_version_is_unsupported_not_malformed() {
        let err = EncryptionMeta::from_value(&json!({"version": -1, "salt": "abc"})).unwrap_err();
        assert_eq!(err, SealError::UnsupportedVersion("-1".into()));
    }

    #[test]
    fn rejects_fractional_version() {
        let err = EncryptionMeta::from_value(&json!({"version": 1.5, "salt": "abc"})).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_extra_metadata_keys() {
        let err = EncryptionMeta::from_value(&json!({"version": 1, "salt": "abc", "kdf": "scrypt"}))
            .unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_non_string_salt() {
        let err = EncryptionMeta::from_value(&json!({"version": 1, "salt": 42})).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }

    #[test]
    fn value_round_trips_through_serde() {
        let meta = EncryptionMeta::current("c2FsdA==".into());
        assert_eq!(EncryptionMeta::from_value(&meta.to_value().unwrap()).unwrap(), meta);
    }

    #[test]
    fn rejects_non_integer_version() {
        let err = EncryptionMeta::from_value(&json!({"version": "1", "salt": "abc"})).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_missing_salt() {
        let err = EncryptionMeta::from_value(&json!({"version": 1})).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
        let err = EncryptionMeta::from_value(&json!({"version": 1, "salt": ""})).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_non_mapping() {
        let err = EncryptionMeta::from_value(&json!("v1")).unwrap_err();
        assert!(matches!(err, SealError::MalformedDocument(_)));
    }
}
