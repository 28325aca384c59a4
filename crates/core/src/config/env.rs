//! Environment variable names and `${VAR}` expansion.

use regex_lite::{Captures, Regex};
use std::sync::OnceLock;

pub const CONFIG_PATH: &str = "MONITOR_CONFIG";
pub const VAULT_ADDRESS: &str = "VAULT_ADDRESS";
pub const STATE_API_URL: &str = "STATE_API_URL";
pub const INTERVAL_SECS: &str = "MONITOR_INTERVAL_SECS";
pub const MAX_FAILURES: &str = "MONITOR_MAX_FAILURES";
pub const CYCLE_TIMEOUT_SECS: &str = "MONITOR_CYCLE_TIMEOUT_SECS";
pub const LOG_FORMAT: &str = "LOG_FORMAT";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"))
}

/// Substitute `${NAME}` with the value of `NAME`; unset names stay literal.
pub fn expand_env(s: &str) -> String {
    placeholder()
        .replace_all(s, |caps: &Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
