//! Recursive traversal that seals and unseals sensitive leaves of a document.
//!
//! Documents are [`serde_json::Value`] trees. Mappings, sequences and scalars are
//! matched exhaustively, and every function here returns a fresh tree: the
//! caller's document is never patched in place.
//!
//! # Rules
//!
//! - Mapping or sequence values are always recursed into, whatever their key.
//! - A scalar is only touched when it is the direct value of a mapping key.
//!   Scalars inside sequences are copied as-is; sensitivity is decided by the
//!   enclosing key name, never by position.
//! - Encryption skips values that already have the `ENC[...]` shape, so a second
//!   pass over a sealed document changes nothing. A plaintext string that merely
//!   looks like a token (`ENC[draft]`) is kept as-is and will fail decryption;
//!   encryption logs a warning for it.

pub mod sensitive;

pub use sensitive::{SensitiveFields, DEFAULT_SENSITIVE_FIELDS};

use std::convert::Infallible;

use confseal_common::SealError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::crypto::{decrypt_value, encrypt_value, has_token_payload, is_token, DerivedKey};

/// Placeholder shown instead of sensitive values by [`redact`].
pub const REDACTED: &str = "*******";

/// Seal every plaintext string stored under a key in `fields`.
///
/// # Errors
///
/// Returns [`SealError::Encryption`] or [`SealError::KeyDerivation`] (nonce
/// entropy) if any single value fails; no partial document is returned.
pub fn walk_encrypt(
    node: &Value,
    key: &DerivedKey,
    fields: &SensitiveFields,
) -> Result<Value, SealError> {
    let mut sealed = 0usize;
    let out = map_leaves(node, &mut |name: &str, leaf: &Value| -> Result<Value, SealError> {
        if let Value::String(s) = leaf {
            if is_token(s) && !has_token_payload(s) {
                warn!(
                    field = name,
                    "value has the ENC[...] shape but no valid payload; decryption will reject it"
                );
            }
        }
        if !fields.contains(name) {
            return Ok(leaf.clone());
        }
        match leaf {
            Value::String(s) if !is_token(s) => {
                sealed += 1;
                Ok(Value::String(encrypt_value(s, key)?))
            }
            Value::String(_) | Value::Null => Ok(leaf.clone()),
            Value::Bool(_) | Value::Number(_) => {
                warn!(field = name, "sensitive field holds a non-string value; left unencrypted");
                Ok(leaf.clone())
            }
            Value::Array(_) | Value::Object(_) => Ok(leaf.clone()),
        }
    })?;
    debug!(sealed, "sensitive fields encrypted");
    Ok(out)
}

/// Unseal every `ENC[...]` string stored directly under a mapping key.
///
/// Plain strings pass through, so partially sealed documents decrypt cleanly.
///
/// # Errors
///
/// Returns [`SealError::Decryption`] if any token fails; no partial document is
/// returned.
pub fn walk_decrypt(node: &Value, key: &DerivedKey) -> Result<Value, SealError> {
    let mut opened = 0usize;
    let out = map_leaves(node, &mut |_name: &str, leaf: &Value| -> Result<Value, SealError> {
        match leaf {
            Value::String(s) if is_token(s) => {
                opened += 1;
                Ok(Value::String(decrypt_value(s, key)?))
            }
            _ => Ok(leaf.clone()),
        }
    })?;
    debug!(opened, "encrypted fields decrypted");
    Ok(out)
}

/// Copy `node` with every scalar under a sensitive key replaced by [`REDACTED`].
pub fn redact(node: &Value, fields: &SensitiveFields) -> Value {
    let result = map_leaves(node, &mut |name: &str, leaf: &Value| -> Result<Value, Infallible> {
        if fields.contains(name) {
            Ok(Value::String(REDACTED.to_owned()))
        } else {
            Ok(leaf.clone())
        }
    });
    match result {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

/// Rebuild `node`, passing each scalar that sits directly under a mapping key
/// through `leaf` together with that key.
fn map_leaves<F, E>(node: &Value, leaf: &mut F) -> Result<Value, E>
where
    F: FnMut(&str, &Value) -> Result<Value, E>,
{
    match node {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (name, child) in map {
                let mapped = match child {
                    Value::Object(_) | Value::Array(_) => map_leaves(child, leaf)?,
                    scalar => leaf(name, scalar)?,
                };
                out.insert(name.clone(), mapped);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(match item {
                    Value::Object(_) | Value::Array(_) => map_leaves(item, leaf)?,
                    scalar => scalar.clone(),
                });
            }
            Ok(Value::Array(out))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(node.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use serde_json::json;

    fn key() -> DerivedKey {
        DerivedKey::from_bytes([0x42; KEY_LEN])
    }

    fn text(v: &Value) -> String {
        serde_json::to_string(v).unwrap()
    }

    #[test]
    fn encrypts_only_sensitive_fields() {
        let doc = json!({
            "name": "acct1",
            "username": "trader",
            "password": "secret123",
            "port": 4001,
        });
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert!(is_token(out["password"].as_str().unwrap()));
        assert_eq!(out["name"], "acct1");
        assert_eq!(out["username"], "trader");
        assert_eq!(out["port"], 4001);
    }

    #[test]
    fn encrypts_inside_sequences_of_mappings() {
        let doc = json!({
            "accounts": [
                {"name": "acct1", "password": "secret123"},
                {"name": "acct2", "password": "secret123", "vnc_password": "vnc"},
            ]
        });
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        let a = out["accounts"][0]["password"].as_str().unwrap();
        let b = out["accounts"][1]["password"].as_str().unwrap();
        assert!(is_token(a) && is_token(b));
        assert_ne!(a, b);
        assert!(is_token(out["accounts"][1]["vnc_password"].as_str().unwrap()));
    }

    #[test]
    fn deeply_nested_fields_are_found() {
        let doc = json!({"a": {"b": [[{"c": {"password": "deep"}}]]}});
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert!(is_token(out["a"]["b"][0][0]["c"]["password"].as_str().unwrap()));
    }

    #[test]
    fn sequence_scalars_are_never_encrypted() {
        let doc = json!({"password": ["a", "b"], "list": ["password"]});
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn non_string_sensitive_values_untouched() {
        let doc = json!({"password": 1234, "vnc_password": null, "nested": {"password": true}});
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn sensitive_key_with_mapping_value_is_recursed() {
        let doc = json!({"password": {"password": "inner", "hint": "none"}});
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert!(is_token(out["password"]["password"].as_str().unwrap()));
        assert_eq!(out["password"]["hint"], "none");
    }

    #[test]
    fn scalar_root_unchanged() {
        let k = key();
        let fields = SensitiveFields::default();
        for doc in [json!("password"), json!(3), json!(null), json!(["x"])] {
            assert_eq!(walk_encrypt(&doc, &k, &fields).unwrap(), doc);
            assert_eq!(walk_decrypt(&doc, &k).unwrap(), doc);
        }
    }

    #[test]
    fn second_pass_leaves_tokens_byte_identical() {
        let k = key();
        let fields = SensitiveFields::default();
        let doc = json!({"accounts": [{"password": "one"}, {"password": "two"}]});
        let once = walk_encrypt(&doc, &k, &fields).unwrap();
        let twice = walk_encrypt(&once, &k, &fields).unwrap();
        assert_eq!(text(&once), text(&twice));
    }

    #[test]
    fn decrypt_restores_and_preserves_order() {
        let k = key();
        let doc = json!({"zeta": 1, "password": "pw", "alpha": {"vnc_password": "v", "b": 2}});
        let sealed = walk_encrypt(&doc, &k, &SensitiveFields::default()).unwrap();
        let opened = walk_decrypt(&sealed, &k).unwrap();
        assert_eq!(text(&opened), text(&doc));
    }

    #[test]
    fn decrypt_passes_plaintext_through() {
        let doc = json!({"password": "not sealed", "other": "ENC-ish"});
        assert_eq!(walk_decrypt(&doc, &key()).unwrap(), doc);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let doc = json!({"password": "pw"});
        let sealed = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        let wrong = DerivedKey::from_bytes([0x24; KEY_LEN]);
        assert_eq!(walk_decrypt(&sealed, &wrong).unwrap_err(), SealError::Decryption);
    }

    #[test]
    fn token_shaped_plaintext_is_kept_and_fails_decryption() {
        let k = key();
        let doc = json!({"note": "ENC[draft]", "password": "pw"});
        let sealed = walk_encrypt(&doc, &k, &SensitiveFields::default()).unwrap();
        assert_eq!(sealed["note"], json!("ENC[draft]"));
        assert_eq!(walk_decrypt(&sealed, &k).unwrap_err(), SealError::Decryption);
    }

    #[test]
    fn caller_document_is_not_mutated() {
        let doc = json!({"password": "pw"});
        let before = doc.clone();
        let _ = walk_encrypt(&doc, &key(), &SensitiveFields::default()).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn custom_field_set() {
        let doc = json!({"api_key": "k", "password": "p"});
        let out = walk_encrypt(&doc, &key(), &SensitiveFields::new(["api_key"])).unwrap();
        assert!(is_token(out["api_key"].as_str().unwrap()));
        assert_eq!(out["password"], "p");
    }

    #[test]
    fn redact_masks_sensitive_scalars() {
        let doc = json!({"accounts": [{"name": "a", "password": "pw", "vnc_password": 12}]});
        let out = redact(&doc, &SensitiveFields::default());
        assert_eq!(
            out,
            json!({"accounts": [{"name": "a", "password": REDACTED, "vnc_password": REDACTED}]})
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use proptest::prelude::*;

    fn arb_key_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("password".to_owned()),
            Just("vnc_password".to_owned()),
            "[a-z_]{1,8}",
        ]
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        ]
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::vec((arb_key_name(), inner), 0..5)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    fn text(v: &Value) -> String {
        serde_json::to_string(v).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Decrypting a sealed document restores it exactly, key order included.
        #[test]
        fn round_trip(doc in arb_document()) {
            let key = DerivedKey::from_bytes([7; KEY_LEN]);
            let sealed = walk_encrypt(&doc, &key, &SensitiveFields::default()).unwrap();
            let opened = walk_decrypt(&sealed, &key).unwrap();
            prop_assert_eq!(text(&opened), text(&doc));
        }

        /// A second encryption pass is a no-op.
        #[test]
        fn encryption_is_idempotent(doc in arb_document()) {
            let key = DerivedKey::from_bytes([7; KEY_LEN]);
            let fields = SensitiveFields::default();
            let once = walk_encrypt(&doc, &key, &fields).unwrap();
            let twice = walk_encrypt(&once, &key, &fields).unwrap();
            prop_assert_eq!(text(&once), text(&twice));
        }

        /// Outside sensitive values, the sealed document equals the input.
        #[test]
        fn non_sensitive_data_untouched(doc in arb_document()) {
            let key = DerivedKey::from_bytes([7; KEY_LEN]);
            let fields = SensitiveFields::default();
            let sealed = walk_encrypt(&doc, &key, &fields).unwrap();
            prop_assert_eq!(text(&redact(&sealed, &fields)), text(&redact(&doc, &fields)));
        }
    }
}
