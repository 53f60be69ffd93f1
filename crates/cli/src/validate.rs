//! Structural checks for plaintext account configurations.

use std::fmt;

use serde_json::{Map, Value};

const REQUIRED_ACCOUNT_FIELDS: &[&str] = &["name", "username", "password", "port", "trading_mode"];
const TRADING_MODES: &[&str] = &["live", "paper"];
const PLACEHOLDER_MARKER: &str = "YOUR_PASSWORD";

/// Findings for one document. Errors make the document unusable; warnings do not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.errors.is_empty() {
            writeln!(f, "ERRORS:")?;
            for e in &self.errors {
                writeln!(f, "  - {e}")?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "WARNINGS:")?;
            for w in &self.warnings {
                writeln!(f, "  - {w}")?;
            }
        }
        if self.errors.is_empty() && self.warnings.is_empty() {
            writeln!(f, "Configuration is valid!")?;
        }
        Ok(())
    }
}

/// Check a decrypted configuration document.
pub fn check(config: &Value) -> Report {
    let mut report = Report::default();
    let Value::Object(root) = config else {
        report.error("configuration root must be a mapping");
        return report;
    };

    if !root.contains_key("global_settings") {
        report.warn("missing 'global_settings' section (defaults will be used)");
    }

    match root.get("accounts") {
        None => report.error("missing required 'accounts' section"),
        Some(Value::Array(accounts)) if accounts.is_empty() => {
            report.error("'accounts' list is empty")
        }
        Some(Value::Array(accounts)) => check_accounts(accounts, &mut report),
        Some(_) => report.error("'accounts' must be a list"),
    }

    if !root.contains_key("server") {
        report.warn("missing 'server' section (will need to provide at runtime)");
    }

    report
}

fn check_accounts(accounts: &[Value], report: &mut Report) {
    let mut ports: Vec<&Value> = Vec::new();
    let mut names: Vec<&Value> = Vec::new();

    for (i, account) in accounts.iter().enumerate() {
        let Value::Object(account) = account else {
            report.error(format!("account {i}: must be a mapping"));
            continue;
        };
        let label = display_name(account);

        for field in REQUIRED_ACCOUNT_FIELDS {
            if !account.contains_key(*field) {
                report.error(format!("account {i} ({label}): missing required field '{field}'"));
            }
        }

        if let Some(port) = account.get("port") {
            if ports.contains(&port) {
                report.error(format!("account {label}: duplicate port {port}"));
            }
            ports.push(port);
        }

        if let Some(name) = account.get("name") {
            if names.contains(&name) {
                report.error(format!("account {label}: duplicate name"));
            }
            names.push(name);
        }

        if let Some(mode) = account.get("trading_mode") {
            if !mode.as_str().is_some_and(|m| TRADING_MODES.contains(&m)) {
                report.error(format!(
                    "account {label}: trading_mode must be 'live' or 'paper', got {mode}"
                ));
            }
        }

        let password = account.get("password").and_then(Value::as_str).unwrap_or("");
        if password.is_empty() || password.contains(PLACEHOLDER_MARKER) {
            report.warn(format!("account {label}: password appears to be a placeholder"));
        }
    }
}

fn display_name(account: &Map<String, Value>) -> String {
    match account.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_owned(),
    }
}
