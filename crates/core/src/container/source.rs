//! [`PassphraseSource`]: how the orchestrator obtains a passphrase without doing I/O itself.

use confseal_common::SealError;

/// Supplies the operator passphrase on demand.
///
/// The resolution policy (environment, key file, prompt, ...) lives with the
/// caller; the container only ever sees the resolved string. Any
/// `Fn() -> Result<String, SealError>` closure is a source.
pub trait PassphraseSource {
    /// Return the passphrase, or why none is available.
    fn passphrase(&self) -> Result<String, SealError>;
}

impl<F> PassphraseSource for F
where
    F: Fn() -> Result<String, SealError>,
{
    fn passphrase(&self) -> Result<String, SealError> {
        self()
    }
}
