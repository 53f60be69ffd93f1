//! PBKDF2-HMAC-SHA256 key derivation and the [`DerivedKey`] buffer.

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use base64::Engine as _;
use confseal_common::SealError;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use super::B64;

/// Byte length of a derived AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the key-derivation salt.
pub const SALT_LEN: usize = 16;

/// PBKDF2 rounds for format version 1.
pub const DEFAULT_ITERATIONS: u32 = 480_000;

/// Raw salt bytes.
pub type Salt = [u8; SALT_LEN];

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes.
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    /// Wrap raw key bytes. Intended for tests and callers that manage their own keys.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Cost parameters for the key-stretching function.
///
/// Version-1 documents are always written and read with [`KdfParams::default`].
/// Lower counts exist for tests only; a document sealed with a non-default
/// count cannot be opened with the default one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Custom round count. Zero is clamped to one.
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Number of PBKDF2 rounds.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Stretch `passphrase` into a key.
    ///
    /// If `salt` is `None`, [`SALT_LEN`] bytes are drawn from the OS CSPRNG.
    /// Deterministic for a given `(passphrase, salt)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::KeyDerivation`] if the entropy source fails.
    pub fn derive(
        &self,
        passphrase: &str,
        salt: Option<Salt>,
    ) -> Result<(DerivedKey, Salt), SealError> {
        let salt = match salt {
            Some(s) => s,
            None => random_salt()?,
        };

        let mut key = Box::new([0u8; KEY_LEN]);
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &salt, self.iterations, &mut key[..]);
        Ok((DerivedKey(key), salt))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

/// [`KdfParams::derive`] with the version-1 cost.
pub fn derive_key(passphrase: &str, salt: Option<Salt>) -> Result<(DerivedKey, Salt), SealError> {
    KdfParams::default().derive(passphrase, salt)
}

/// Generate a random passphrase: 32 CSPRNG bytes, base64url encoded.
///
/// # Errors
///
/// Returns [`SealError::KeyDerivation`] if the entropy source fails.
pub fn generate_passphrase() -> Result<String, SealError> {
    let mut bytes = [0u8; KEY_LEN];
    fill_random(&mut bytes)?;
    let encoded = B64.encode(&bytes);
    bytes.zeroize();
    Ok(encoded)
}

/// Encode a salt for the container metadata.
pub(crate) fn encode_salt(salt: &Salt) -> String {
    B64.encode(salt)
}

/// Decode a salt from the container metadata.
pub(crate) fn decode_salt(encoded: &str) -> Result<Salt, SealError> {
    let bytes = B64
        .decode(encoded)
        .map_err(|_| SealError::malformed("salt is not valid base64"))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        SealError::malformed(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            b.len()
        ))
    })
}

fn random_salt() -> Result<Salt, SealError> {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt)?;
    Ok(salt)
}

pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), SealError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| SealError::KeyDerivation(format!("entropy source failed: {e}")))
}
