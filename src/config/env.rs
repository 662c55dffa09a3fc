// src/config/env.rs
// Environment-based overrides - single source of truth for all env vars

use tracing::warn;

/// Overrides read from HERALD_* environment variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    /// HERALD_INITIAL_DELAY_MS
    pub initial_delay_ms: Option<u64>,
    /// HERALD_PERIOD_MS
    pub period_ms: Option<u64>,
    /// HERALD_DISPLAY
    pub display: Option<String>,
    /// HERALD_DEBUG
    pub debug: Option<bool>,
    /// HERALD_SHOW_NON_INFORMING
    pub show_non_informing: Option<bool>,
}

impl EnvOverrides {
    /// Load overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load overrides through an arbitrary lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            initial_delay_ms: read("HERALD_INITIAL_DELAY_MS").and_then(|v| parse_millis("HERALD_INITIAL_DELAY_MS", &v)),
            period_ms: read("HERALD_PERIOD_MS").and_then(|v| parse_millis("HERALD_PERIOD_MS", &v)),
            display: read("HERALD_DISPLAY"),
            debug: read("HERALD_DEBUG").and_then(|v| parse_bool(&v)),
            show_non_informing: read("HERALD_SHOW_NON_INFORMING").and_then(|v| parse_bool(&v)),
        }
    }
}

fn parse_millis(name: &str, value: &str) -> Option<u64> {
    match value.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!(var = name, value, "Ignoring non-numeric duration");
            None
        }
    }
}

/// Parse a boolean flag value ("1", "true", "yes", "on" and their negations)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
