//! Common error types shared across crates.

use thiserror::Error;

/// Top-level error type for every encrypt/decrypt call.
///
/// Variants map to process exit codes returned by the command line:
/// - [`SealError::Decryption`] → 2
/// - [`SealError::AlreadyEncrypted`], [`SealError::NotEncrypted`],
///   [`SealError::UnsupportedVersion`] → 3
/// - [`SealError::MalformedDocument`] → 4
/// - [`SealError::PassphraseUnavailable`] → 5
/// - everything else → 1
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SealError {
    /// The entropy source or the key-stretching function failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// `encrypt` was called on a document that already carries container metadata.
    #[error("document is already encrypted")]
    AlreadyEncrypted,

    /// `decrypt` was called on a document without container metadata.
    #[error("document is not encrypted")]
    NotEncrypted,

    /// The container metadata names a format version this build cannot read.
    #[error("unsupported encryption format version: {0}")]
    UnsupportedVersion(String),

    /// Authentication or decoding failure. Deliberately carries no detail.
    #[error("failed to decrypt: wrong passphrase or corrupted data")]
    Decryption,

    /// AEAD encryption of a value failed.
    #[error("encryption failed")]
    Encryption,

    /// The document shape is not usable (non-mapping root, broken metadata).
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// No passphrase could be obtained, or the one obtained is unusable.
    #[error("passphrase unavailable: {0}")]
    PassphraseUnavailable(String),
}

impl SealError {
    /// Returns the process exit code that should be used for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SealError::Decryption => 2,
            SealError::AlreadyEncrypted
            | SealError::NotEncrypted
            | SealError::UnsupportedVersion(_) => 3,
            SealError::MalformedDocument(_) => 4,
            SealError::PassphraseUnavailable(_) => 5,
            SealError::KeyDerivation(_) | SealError::Encryption => 1,
        }
    }

    /// Shorthand for [`SealError::MalformedDocument`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        SealError::MalformedDocument(msg.into())
    }
}
