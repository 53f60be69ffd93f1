//! Selective encryption of secrets inside configuration documents.
//!
//! A key is stretched from an operator passphrase ([`crypto::kdf`]), every
//! sensitive leaf is sealed into an `ENC[...]` token ([`crypto::cipher`]) by the
//! document walker ([`walker`]), and the salt plus format version are embedded
//! at the document root ([`container`]) so that the passphrase alone is enough
//! to decrypt later.
//!
//! # Module invariants
//!
//! - **No I/O.** Nothing in this crate reads files, the environment, or a terminal.
//!   Passphrases reach the core through [`PassphraseSource`].
//! - **No shared state.** Every call derives its own key and works on its own copy
//!   of the document.

pub mod container;
pub mod crypto;
pub mod walker;

pub use confseal_common::SealError;
pub use container::{decrypt_config, encrypt_config, is_encrypted, ConfigSealer, PassphraseSource};
pub use crypto::{DerivedKey, KdfParams};
pub use walker::SensitiveFields;
