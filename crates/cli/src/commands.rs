//! Command handlers.
//!
//! Every seal or unseal call runs on a blocking worker: key derivation is
//! deliberately slow and must not stall the runtime.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use confseal_core::{crypto::generate_passphrase, is_encrypted, walker, ConfigSealer, SealError};
use serde_json::Value;
use tracing::info;

use crate::{
    cli::Command,
    document::{self, Format},
    passphrase::PassphraseChain,
    validate,
};

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub sealer: ConfigSealer,
    pub passphrases: PassphraseChain,
}

impl Context {
    pub fn new(sealer: ConfigSealer, passphrases: PassphraseChain) -> Self {
        Self { sealer, passphrases }
    }
}

pub async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Encrypt { input, output } => encrypt(ctx, &input, output).await,
        Command::Decrypt { input, output } => decrypt(ctx, &input, output).await,
        Command::View { input } => view(ctx, &input).await,
        Command::Validate { input } => validate(ctx, &input).await,
        Command::GenerateKey => generate_key(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn encrypt(ctx: &Context, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let (doc, format) = document::load(input).await?;
    if is_encrypted(&doc) {
        return Err(SealError::AlreadyEncrypted)
            .with_context(|| format!("refusing to encrypt {}", input.display()));
    }
    let output = output.unwrap_or_else(|| document::default_encrypted_path(input));

    let sealer = ctx.sealer.clone();
    let source = ctx.passphrases.clone().confirm(true);
    let sealed = tokio::task::spawn_blocking(move || sealer.encrypt_with(&doc, &source))
        .await
        .context("encryption worker failed")??;

    document::save(&output, &sealed, format).await?;
    info!(input = %input.display(), output = %output.display(), "configuration encrypted");

    println!("Encrypted configuration saved to: {}", output.display());
    println!();
    println!("IMPORTANT: delete the plaintext configuration file:");
    println!("  rm {}", input.display());
    Ok(())
}

async fn decrypt(ctx: &Context, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let (doc, format) = document::load(input).await?;
    let opened = unseal(ctx, doc)
        .await
        .with_context(|| format!("failed to decrypt {}", input.display()))?;

    match output {
        Some(path) => {
            document::save(&path, &opened, format).await?;
            info!(input = %input.display(), output = %path.display(), "configuration decrypted");
            println!("Decrypted configuration saved to: {}", path.display());
        }
        None => print!("{}", document::render(&opened, format)?),
    }
    Ok(())
}

async fn view(ctx: &Context, input: &Path) -> Result<()> {
    let (doc, _) = document::load(input).await?;
    let doc = open_if_sealed(ctx, doc, input).await?;
    let masked = walker::redact(&doc, ctx.sealer.fields());

    let rule = "=".repeat(60);
    println!("{rule}");
    println!("Configuration (sensitive values masked)");
    println!("{rule}");
    print!("{}", document::render(&masked, Format::Yaml)?);
    Ok(())
}

async fn validate(ctx: &Context, input: &Path) -> Result<()> {
    let (doc, _) = document::load(input).await?;
    let doc = open_if_sealed(ctx, doc, input).await?;
    let report = validate::check(&doc);

    println!("Validation results for: {}", input.display());
    println!("{}", "-".repeat(40));
    print!("{report}");

    if !report.is_valid() {
        anyhow::bail!(
            "{} failed validation with {} error(s)",
            input.display(),
            report.errors.len()
        );
    }
    Ok(())
}

fn generate_key() -> Result<()> {
    let key = generate_passphrase()?;
    println!("Generated passphrase (store this securely):");
    println!("{key}");
    println!();
    println!("Save it to ~/.confseal-key or set it as CONFSEAL_KEY.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn unseal(ctx: &Context, doc: Value) -> Result<Value> {
    let sealer = ctx.sealer.clone();
    let source = ctx.passphrases.clone();
    let opened = tokio::task::spawn_blocking(move || sealer.decrypt_with(&doc, &source))
        .await
        .context("decryption worker failed")??;
    Ok(opened)
}

async fn open_if_sealed(ctx: &Context, doc: Value, input: &Path) -> Result<Value> {
    if !is_encrypted(&doc) {
        return Ok(doc);
    }
    unseal(ctx, doc)
        .await
        .with_context(|| format!("failed to decrypt {}", input.display()))
}
