//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Encrypt and decrypt the secrets inside account configuration files.
#[derive(Debug, Parser)]
#[command(name = "confseal", version, about)]
pub struct Cli {
    /// Key file read when the passphrase variable is unset
    /// [default: ~/.confseal-key, env: CONFSEAL_KEY_FILE]
    #[arg(long, global = true, value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// Fail instead of prompting when no passphrase is configured
    #[arg(long, global = true)]
    pub no_prompt: bool,

    /// Log level or filter directive [default: warn, env: CONFSEAL_LOG_LEVEL]
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt the sensitive fields of a configuration file
    Encrypt {
        input: PathBuf,
        /// Output file [default: <INPUT>.encrypted]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decrypt a configuration file
    Decrypt {
        input: PathBuf,
        /// Output file [default: stdout]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a configuration with sensitive values masked
    View { input: PathBuf },
    /// Check the account structure of a configuration, encrypted or not
    Validate { input: PathBuf },
    /// Print a new random passphrase
    GenerateKey,
}
