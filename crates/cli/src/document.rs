//! Reading and writing configuration documents as YAML or JSON.
//!
//! The format is picked from the file name once a trailing `.encrypted` is
//! stripped; unknown extensions try YAML first and fall back to JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use confseal_core::SealError;
use serde_json::Value;

const ENCRYPTED_SUFFIX: &str = "encrypted";

/// Serialization format of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Format implied by `path`, or `None` when the extension says nothing.
    pub fn detect(path: &Path) -> Option<Self> {
        let mut path = path;
        if path.extension().is_some_and(|ext| ext == ENCRYPTED_SUFFIX) {
            path = Path::new(path.file_stem()?);
        }
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Parse `text`, honouring `format` when known.
///
/// # Errors
///
/// Returns [`SealError::MalformedDocument`] when the text is not valid in the
/// requested format (or in either format when `format` is `None`).
pub fn parse(text: &str, format: Option<Format>) -> Result<(Value, Format), SealError> {
    match format {
        Some(Format::Yaml) => serde_yaml::from_str(text)
            .map(|doc| (doc, Format::Yaml))
            .map_err(|e| SealError::malformed(format!("invalid YAML: {e}"))),
        Some(Format::Json) => serde_json::from_str(text)
            .map(|doc| (doc, Format::Json))
            .map_err(|e| SealError::malformed(format!("invalid JSON: {e}"))),
        None => {
            if let Ok(doc) = serde_yaml::from_str(text) {
                Ok((doc, Format::Yaml))
            } else if let Ok(doc) = serde_json::from_str(text) {
                Ok((doc, Format::Json))
            } else {
                Err(SealError::malformed("document is neither YAML nor JSON"))
            }
        }
    }
}

/// Serialize `doc` in `format`, keeping key order.
pub fn render(doc: &Value, format: Format) -> Result<String> {
    match format {
        Format::Yaml => serde_yaml::to_string(doc).context("failed to serialise YAML"),
        Format::Json => {
            let mut text = serde_json::to_string_pretty(doc).context("failed to serialise JSON")?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Read and parse the document at `path`.
pub async fn load(path: &Path) -> Result<(Value, Format)> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = parse(&text, Format::detect(path))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

/// Serialize `doc` and write it to `path`.
pub async fn save(path: &Path, doc: &Value, format: Format) -> Result<()> {
    let text = render(doc, format)?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// `<input>.encrypted`.
pub fn default_encrypted_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}
