//! Passphrase key stretching and AES-256-GCM-SIV value encryption.
//!
//! This module is intentionally free of document and I/O concerns.
//! It provides the low-level operations used by the walker and the container.
//!
//! # Token format
//!
//! ```text
//! ENC[<base64url(nonce || ciphertext || tag)>]
//! ```
//!
//! The token shape alone distinguishes sealed values from plaintext, which is
//! what makes re-encryption a no-op and lets mixed documents decrypt cleanly.

pub mod cipher;
pub mod kdf;

pub use cipher::{decrypt_value, encrypt_value, has_token_payload, is_token, CipherError};
pub use kdf::{derive_key, generate_passphrase, DerivedKey, KdfParams, Salt, KEY_LEN, SALT_LEN};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

/// URL-safe base64 used for both tokens and salts. Emits padding, accepts either.
pub(crate) const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
