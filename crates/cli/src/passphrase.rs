//! Passphrase resolution: environment variable, then key file, then terminal prompt.
//!
//! Each step is skipped when it yields nothing usable (unset variable, missing
//! file, empty contents). The chain is handed to the core as a
//! [`PassphraseSource`], so it is only consulted once a document has been
//! confirmed to need one.
//!
//! # Errors
//!
//! Resolution fails with [`SealError::PassphraseUnavailable`] when every step
//! is exhausted, when the key file exists but cannot be read, or when the two
//! prompted entries differ.

use std::path::{Path, PathBuf};

use confseal_core::{PassphraseSource, SealError};
use tracing::{debug, info};
use zeroize::Zeroize;

/// Where a resolved passphrase came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Env,
    KeyFile,
    Prompt,
}

/// Ordered passphrase lookup.
#[derive(Debug, Clone)]
pub struct PassphraseChain {
    env_var: String,
    key_file: Option<PathBuf>,
    interactive: bool,
    confirm: bool,
}

impl PassphraseChain {
    pub fn new(env_var: impl Into<String>, key_file: Option<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            key_file,
            interactive: true,
            confirm: false,
        }
    }

    /// Allow or forbid the final terminal prompt.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Ask for the prompted passphrase twice. Used when encrypting.
    pub fn confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    /// Walk the chain and return the first non-empty passphrase.
    pub fn resolve(&self) -> Result<(String, Origin), SealError> {
        if let Some(passphrase) = self.env_passphrase() {
            return Ok((passphrase, Origin::Env));
        }
        if let Some(passphrase) = self.key_file_passphrase()? {
            return Ok((passphrase, Origin::KeyFile));
        }
        if self.interactive {
            return self.prompt_passphrase().map(|p| (p, Origin::Prompt));
        }
        Err(SealError::PassphraseUnavailable(self.exhausted_message()))
    }

    fn env_passphrase(&self) -> Option<String> {
        std::env::var(&self.env_var)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn key_file_passphrase(&self) -> Result<Option<String>, SealError> {
        let Some(path) = self.key_file.as_deref() else {
            return Ok(None);
        };
        if !path.exists() {
            debug!(path = %path.display(), "key file not present");
            return Ok(None);
        }
        read_key_file(path)
    }

    fn prompt_passphrase(&self) -> Result<String, SealError> {
        let passphrase = prompt("Enter encryption passphrase: ")?;
        if passphrase.is_empty() {
            return Err(SealError::PassphraseUnavailable(
                "empty passphrase entered".into(),
            ));
        }
        if self.confirm {
            let mut again = prompt("Confirm encryption passphrase: ")?;
            let matches = again == passphrase;
            again.zeroize();
            if !matches {
                return Err(SealError::PassphraseUnavailable(
                    "passphrases do not match".into(),
                ));
            }
        }
        Ok(passphrase)
    }

    fn exhausted_message(&self) -> String {
        match &self.key_file {
            Some(path) => format!(
                "no passphrase found: set {} or create {}",
                self.env_var,
                path.display()
            ),
            None => format!("no passphrase found: set {}", self.env_var),
        }
    }
}

impl PassphraseSource for PassphraseChain {
    fn passphrase(&self) -> Result<String, SealError> {
        let (passphrase, origin) = self.resolve()?;
        info!(?origin, "passphrase resolved");
        Ok(passphrase)
    }
}

fn read_key_file(path: &Path) -> Result<Option<String>, SealError> {
    let mut contents = std::fs::read_to_string(path).map_err(|e| {
        SealError::PassphraseUnavailable(format!(
            "key file {} is unreadable: {e}",
            path.display()
        ))
    })?;
    let trimmed = contents.trim().to_owned();
    contents.zeroize();
    Ok((!trimmed.is_empty()).then_some(trimmed))
}

fn prompt(text: &str) -> Result<String, SealError> {
    rpassword::prompt_password(text)
        .map_err(|e| SealError::PassphraseUnavailable(format!("cannot read from terminal: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Each test uses its own variable name so parallel tests never interfere.
    fn chain(var: &str, key_file: Option<PathBuf>) -> PassphraseChain {
        PassphraseChain::new(var, key_file).interactive(false)
    }

    fn key_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn env_wins_over_key_file() {
        std::env::set_var("CONFSEAL_TEST_ENV_WINS", "from-env");
        let file = key_file("from-file");
        let resolved = chain("CONFSEAL_TEST_ENV_WINS", Some(file.path().into()))
            .resolve()
            .unwrap();
        assert_eq!(resolved, ("from-env".to_owned(), Origin::Env));
    }

    #[test]
    fn empty_env_falls_through_to_key_file() {
        std::env::set_var("CONFSEAL_TEST_EMPTY_ENV", "");
        let file = key_file("  from-file\n");
        let resolved = chain("CONFSEAL_TEST_EMPTY_ENV", Some(file.path().into()))
            .resolve()
            .unwrap();
        assert_eq!(resolved, ("from-file".to_owned(), Origin::KeyFile));
    }

    #[test]
    fn whitespace_only_key_file_is_skipped() {
        let file = key_file(" \n\t\n");
        let err = chain("CONFSEAL_TEST_BLANK_FILE", Some(file.path().into()))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SealError::PassphraseUnavailable(_)));
    }

    #[test]
    fn missing_key_file_without_prompt_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent-key");
        let err = chain("CONFSEAL_TEST_MISSING_FILE", Some(path.clone()))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SealError::PassphraseUnavailable(_)));
        let msg = err.to_string();
        assert!(msg.contains("CONFSEAL_TEST_MISSING_FILE"));
        assert!(msg.contains(&path.display().to_string()));
    }

    #[test]
    fn unreadable_key_file_is_an_error() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let err = chain("CONFSEAL_TEST_DIR_AS_FILE", Some(dir.path().into()))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SealError::PassphraseUnavailable(_)));
    }

    #[test]
    fn chain_is_a_passphrase_source() {
        let file = key_file("correct-horse");
        let source = chain("CONFSEAL_TEST_AS_SOURCE", Some(file.path().into()));
        assert_eq!(source.passphrase().unwrap(), "correct-horse");
    }
}
