//! Container format: orchestrates key derivation, the walker, and the root metadata.
//!
//! # Lifecycle
//!
//! 1. [`ConfigSealer::encrypt_config`] refuses documents that already carry
//!    `_encryption`, derives a key under a fresh salt, seals every sensitive leaf,
//!    and appends `_encryption: {version, salt}` at the root.
//! 2. [`ConfigSealer::decrypt_config`] requires that entry, checks the version,
//!    re-derives the key from the stored salt, strips the entry, and unseals the rest.
//!
//! Both are single-pass: they either return a complete document or an error,
//! and never modify the input.

pub mod source;

pub use source::PassphraseSource;

use confseal_common::format::{EncryptionMeta, METADATA_KEY};
use confseal_common::SealError;
use serde_json::{Map, Value};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::kdf::{decode_salt, encode_salt};
use crate::crypto::KdfParams;
use crate::walker::{walk_decrypt, walk_encrypt, SensitiveFields};

/// Seals and unseals whole configuration documents.
#[derive(Debug, Clone, Default)]
pub struct ConfigSealer {
    fields: SensitiveFields,
    kdf: KdfParams,
}

impl ConfigSealer {
    /// Sealer for a custom set of sensitive key names at the version-1 KDF cost.
    pub fn new(fields: SensitiveFields) -> Self {
        Self {
            fields,
            kdf: KdfParams::default(),
        }
    }

    /// Override the key-derivation cost. Only documents sealed with the same
    /// parameters can be opened again.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// The sensitive key names this sealer encrypts.
    pub fn fields(&self) -> &SensitiveFields {
        &self.fields
    }

    /// Encrypt every sensitive field of `document` under `passphrase`.
    ///
    /// # Errors
    ///
    /// - [`SealError::MalformedDocument`] if the root is not a mapping.
    /// - [`SealError::AlreadyEncrypted`] if the root already has `_encryption`.
    /// - [`SealError::PassphraseUnavailable`] if `passphrase` is empty.
    /// - [`SealError::KeyDerivation`] / [`SealError::Encryption`] on crypto failure.
    pub fn encrypt_config(&self, document: &Value, passphrase: &str) -> Result<Value, SealError> {
        let root = root_mapping(document)?;
        if root.contains_key(METADATA_KEY) {
            return Err(SealError::AlreadyEncrypted);
        }
        ensure_passphrase(passphrase)?;

        let (key, salt) = self.kdf.derive(passphrase, None)?;
        let Value::Object(mut sealed) = walk_encrypt(document, &key, &self.fields)? else {
            return Err(SealError::malformed("document root must be a mapping"));
        };

        let meta = EncryptionMeta::current(encode_salt(&salt));
        sealed.insert(METADATA_KEY.to_owned(), meta.to_value()?);
        debug!(version = meta.version, entries = root.len(), "configuration encrypted");
        Ok(Value::Object(sealed))
    }

    /// Decrypt a document previously produced by [`ConfigSealer::encrypt_config`].
    ///
    /// # Errors
    ///
    /// - [`SealError::MalformedDocument`] if the root is not a mapping or the
    ///   metadata is broken (salt missing or not 16 base64 bytes, unknown keys).
    /// - [`SealError::NotEncrypted`] if there is no `_encryption` entry.
    /// - [`SealError::UnsupportedVersion`] for any version other than 1.
    /// - [`SealError::PassphraseUnavailable`] if `passphrase` is empty.
    /// - [`SealError::Decryption`] for a wrong passphrase or tampered value.
    pub fn decrypt_config(&self, document: &Value, passphrase: &str) -> Result<Value, SealError> {
        let root = root_mapping(document)?;
        let meta_value = root.get(METADATA_KEY).ok_or(SealError::NotEncrypted)?;
        let meta = EncryptionMeta::from_value(meta_value)?;
        let salt = decode_salt(&meta.salt)?;
        ensure_passphrase(passphrase)?;

        let (key, _) = self.kdf.derive(passphrase, Some(salt))?;
        let body: Map<String, Value> = root
            .iter()
            .filter(|(name, _)| name.as_str() != METADATA_KEY)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let opened = walk_decrypt(&Value::Object(body), &key)?;
        debug!(version = meta.version, "configuration decrypted");
        Ok(opened)
    }

    /// [`ConfigSealer::encrypt_config`] with the passphrase pulled from `source`.
    ///
    /// An already encrypted document is rejected before the source is asked.
    pub fn encrypt_with<S>(&self, document: &Value, source: &S) -> Result<Value, SealError>
    where
        S: PassphraseSource + ?Sized,
    {
        if root_mapping(document)?.contains_key(METADATA_KEY) {
            return Err(SealError::AlreadyEncrypted);
        }
        let passphrase = Zeroizing::new(source.passphrase()?);
        self.encrypt_config(document, &passphrase)
    }

    /// [`ConfigSealer::decrypt_config`] with the passphrase pulled from `source`.
    ///
    /// The source is only consulted once the metadata, salt included, has been
    /// validated, so a plaintext or broken document never triggers a prompt.
    pub fn decrypt_with<S>(&self, document: &Value, source: &S) -> Result<Value, SealError>
    where
        S: PassphraseSource + ?Sized,
    {
        let root = root_mapping(document)?;
        let meta_value = root.get(METADATA_KEY).ok_or(SealError::NotEncrypted)?;
        let meta = EncryptionMeta::from_value(meta_value)?;
        decode_salt(&meta.salt)?;
        let passphrase = Zeroizing::new(source.passphrase()?);
        self.decrypt_config(document, &passphrase)
    }
}

/// Encrypt with the default sensitive fields and version-1 KDF cost.
pub fn encrypt_config(document: &Value, passphrase: &str) -> Result<Value, SealError> {
    ConfigSealer::default().encrypt_config(document, passphrase)
}

/// Decrypt with the default sensitive fields and version-1 KDF cost.
pub fn decrypt_config(document: &Value, passphrase: &str) -> Result<Value, SealError> {
    ConfigSealer::default().decrypt_config(document, passphrase)
}

/// Returns `true` if `document` is a mapping carrying container metadata.
pub fn is_encrypted(document: &Value) -> bool {
    document
        .as_object()
        .is_some_and(|root| root.contains_key(METADATA_KEY))
}

fn root_mapping(document: &Value) -> Result<&Map<String, Value>, SealError> {
    document
        .as_object()
        .ok_or_else(|| SealError::malformed("document root must be a mapping"))
}

fn ensure_passphrase(passphrase: &str) -> Result<(), SealError> {
    if passphrase.is_empty() {
        return Err(SealError::PassphraseUnavailable("passphrase is empty".into()));
    }
    Ok(())
}
