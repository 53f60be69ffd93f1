//! Tracing setup for the command line tool.
//!
//! All diagnostics go to stderr so that decrypted documents written to stdout
//! stay machine-readable.
//!
//! # Telemetry invariants
//!
//! - **No passphrases, derived keys or plaintext secrets** may appear in any
//!   span attribute or log field. Field counts and file paths are fine.
//! - Log level is configurable via `CONFSEAL_LOG_LEVEL` or `--log-level`
//!   (default: `warn`); `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
