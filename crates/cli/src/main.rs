//! `confseal`: command line entry point.
//!
//! Startup sequence:
//! 1. Parse arguments.
//! 2. Load and validate [`Config`] from environment variables, then apply flag overrides.
//! 3. Initialise the tracing subscriber (stderr).
//! 4. Build the passphrase chain and sealer.
//! 5. Run the command and map any [`SealError`] to the process exit code.

mod cli;
mod commands;
mod config;
mod document;
mod passphrase;
mod telemetry;
mod validate;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use confseal_core::{ConfigSealer, SealError};
use tracing::debug;

use cli::Cli;
use commands::Context;
use crate::config::Config;
use passphrase::PassphraseChain;

#[tokio::main]
async fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let args = Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let mut cfg = Config::from_env()?;
    if let Some(level) = args.log_level {
        cfg.log_level = level;
    }
    if let Some(path) = args.key_file {
        cfg.key_file = Some(path);
    }

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level, cfg.log_format)?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        key_env = %cfg.key_env,
        key_file = ?cfg.key_file,
        "confseal starting"
    );

    // -----------------------------------------------------------------------
    // 4. Passphrase chain
    // -----------------------------------------------------------------------
    let passphrases = PassphraseChain::new(cfg.key_env, cfg.key_file).interactive(!args.no_prompt);
    let ctx = Context::new(ConfigSealer::default(), passphrases);

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    commands::dispatch(&ctx, args.command).await
}

/// Exit code of the first [`SealError`] in the chain, or 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<SealError>())
        .map_or(1, SealError::exit_code)
}
