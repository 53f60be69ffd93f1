//! AES-256-GCM-SIV encryption and decryption of individual string values.
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant,
//! so an accidental nonce repeat leaks only plaintext equality instead of the key
//! stream. Each call still draws a fresh random nonce, which keeps identical
//! plaintexts from producing identical tokens.
//!
//! Decryption failures are collapsed into a single [`CipherError::Decrypt`] so a
//! caller can never learn whether the payload, the tag, or the UTF-8 check failed.

use aes_gcm_siv::{
    aead::{Aead, KeyInit},
    Aes256GcmSiv, Nonce,
};
use base64::Engine as _;
use confseal_common::format::{TOKEN_PREFIX, TOKEN_SUFFIX};
use confseal_common::SealError;
use thiserror::Error;

use super::kdf::{fill_random, DerivedKey};
use super::B64;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The nonce could not be drawn from the OS CSPRNG.
    #[error("entropy source failed")]
    Entropy,

    /// AES-GCM-SIV encryption failed.
    #[error("aead encryption failed")]
    Encrypt,

    /// Malformed payload, failed authentication, or non-UTF-8 plaintext.
    #[error("failed to decrypt: wrong passphrase or corrupted data")]
    Decrypt,
}

impl From<CipherError> for SealError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::Entropy => SealError::KeyDerivation("entropy source failed".into()),
            CipherError::Encrypt => SealError::Encryption,
            CipherError::Decrypt => SealError::Decryption,
        }
    }
}

/// Returns `true` if `value` has the `ENC[...]` token shape.
pub fn is_token(value: &str) -> bool {
    value.len() >= TOKEN_PREFIX.len() + TOKEN_SUFFIX.len()
        && value.starts_with(TOKEN_PREFIX)
        && value.ends_with(TOKEN_SUFFIX)
}

/// Returns `true` if `value` is a token whose payload decodes and is long
/// enough to hold a nonce and tag. Says nothing about authenticity.
pub fn has_token_payload(value: &str) -> bool {
    is_token(value)
        && B64
            .decode(&value[TOKEN_PREFIX.len()..value.len() - TOKEN_SUFFIX.len()])
            .is_ok_and(|payload| payload.len() >= NONCE_LEN + TAG_LEN)
}

/// Encrypt `plaintext` into an `ENC[...]` token.
///
/// A random 96-bit nonce is generated per call via the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CipherError::Entropy`] if no nonce could be drawn and
/// [`CipherError::Encrypt`] on an internal AEAD error.
pub fn encrypt_value(plaintext: &str, key: &DerivedKey) -> Result<String, CipherError> {
    let cipher = build_cipher(key).ok_or(CipherError::Encrypt)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    fill_random(&mut nonce_bytes).map_err(|_| CipherError::Entropy)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CipherError::Encrypt)?;

    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);

    Ok(format!("{TOKEN_PREFIX}{}{TOKEN_SUFFIX}", B64.encode(payload)))
}

/// Decrypt an `ENC[...]` token back to its plaintext.
///
/// Input that does not have the token shape is returned unchanged.
///
/// # Errors
///
/// Returns [`CipherError::Decrypt`] if the payload is not base64, is too short,
/// fails authentication (wrong key or tampered data), or is not UTF-8.
pub fn decrypt_value(token: &str, key: &DerivedKey) -> Result<String, CipherError> {
    if !is_token(token) {
        return Ok(token.to_owned());
    }

    let encoded = &token[TOKEN_PREFIX.len()..token.len() - TOKEN_SUFFIX.len()];
    let payload = B64.decode(encoded).map_err(|_| CipherError::Decrypt)?;
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(CipherError::Decrypt);
    }

    let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
    let cipher = build_cipher(key).ok_or(CipherError::Decrypt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CipherError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
}

fn build_cipher(key: &DerivedKey) -> Option<Aes256GcmSiv> {
    Aes256GcmSiv::new_from_slice(key.as_bytes()).ok()
}
