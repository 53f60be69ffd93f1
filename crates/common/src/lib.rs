//! Error taxonomy and container-format definitions shared across `confseal` crates.

pub mod error;
pub mod format;

pub use error::SealError;
pub use format::{EncryptionMeta, FORMAT_VERSION, METADATA_KEY};
