//! Environment variable processing for runtime configuration overrides.
//!
//! Env var prefix: `CTS_HARNESS_`
//!
//! - `CTS_HARNESS_PROFILE`: select a configuration profile
//! - `CTS_HARNESS_FILTER`: test name filter (substring)
//! - `CTS_HARNESS_EXCLUDE`: comma-separated exclusion substrings
//! - `CTS_HARNESS_TIMEOUT`: per-test timeout in seconds
//! - `CTS_HARNESS_THREADS`: host device worker threads
//! - `CTS_HARNESS_SUB_GROUP_SIZE`: host device sub-group width
//! - `CTS_HARNESS_FP64`: advertise fp64 (1/true/yes or 0/false/no)
//! - `CTS_HARNESS_ATOMIC64`: advertise 64-bit atomics
//! - `CTS_HARNESS_SHOW_NOTES`: always/never/on-failure
//! - `CTS_HARNESS_VERBOSE`: enable verbose output
//! - `CTS_HARNESS_VAR_<NAME>`: set test parameter `<NAME>`

use super::{Config, ShowNotes};
use std::collections::HashMap;

const PREFIX: &str = "CTS_HARNESS_";
const VAR_PREFIX: &str = "CTS_HARNESS_VAR_";

/// Read the active profile name from `CTS_HARNESS_PROFILE`.
pub fn get_profile_name() -> Option<String> {
    env_str("PROFILE")
}

/// Collect test parameters from `CTS_HARNESS_VAR_*` env vars.
///
/// The `VAR_` prefix is stripped, so `CTS_HARNESS_VAR_SIZE=1024`
/// produces `("SIZE", "1024")`.
pub fn collect_env_parameters() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for (key, value) in std::env::vars() {
        if let Some(name) = key.strip_prefix(VAR_PREFIX) {
            if !name.is_empty() {
                vars.insert(name.to_string(), value);
            }
        }
    }
    vars
}

/// Apply individual env var overrides to a config.
///
/// Each override is applied only if the env var is set and parses correctly.
/// Invalid values are logged and ignored.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(val) = env_str("FILTER") {
        config.filter.pattern = Some(val);
    }

    if let Some(val) = env_str("EXCLUDE") {
        config.filter.exclude = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(val) = env_parse::<u64>("TIMEOUT") {
        config.run.timeout = Some(val);
    }

    if let Some(val) = env_parse::<usize>("THREADS") {
        config.device.threads = val;
    }

    if let Some(val) = env_parse::<usize>("SUB_GROUP_SIZE") {
        config.device.sub_group_size = Some(val);
    }

    if let Some(val) = env_bool("FP64") {
        config.device.fp64 = val;
    }

    if let Some(val) = env_bool("ATOMIC64") {
        config.device.atomic64 = val;
    }

    if let Some(val) = env_str("SHOW_NOTES") {
        match val.parse::<ShowNotes>() {
            Ok(policy) => config.report.show_notes = policy,
            Err(e) => tracing::warn!("ignoring {PREFIX}SHOW_NOTES: {e}"),
        }
    }

    if let Some(val) = env_bool("VERBOSE") {
        config.verbose = val;
    }

    config.parameters.extend(collect_env_parameters());
}

/// Summarize which env var overrides are currently active.
///
/// Returns a list of `(env_var_name, value)` pairs.
pub fn detect_active_overrides() -> Vec<(String, String)> {
    let keys = [
        "PROFILE",
        "FILTER",
        "EXCLUDE",
        "TIMEOUT",
        "THREADS",
        "SUB_GROUP_SIZE",
        "FP64",
        "ATOMIC64",
        "SHOW_NOTES",
        "VERBOSE",
    ];

    let mut active = Vec::new();
    for key in keys {
        let full = format!("{PREFIX}{key}");
        if let Ok(val) = std::env::var(&full) {
            if !val.is_empty() {
                active.push((full, val));
            }
        }
    }
    active
}

// --- helpers ---

fn env_str(suffix: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{suffix}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    let raw = env_str(suffix)?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        tracing::warn!("ignoring {PREFIX}{suffix}={raw}: not a valid value");
    }
    parsed
}

fn env_bool(suffix: &str) -> Option<bool> {
    env_str(suffix).map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
}

// Env vars are process-global, so serialize tests that mutate them.
#[cfg(test)]
static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run a closure with specific env vars set, then restore them.
///
/// An empty value disables the override for the duration.
#[cfg(test)]
pub(crate) fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut old: Vec<(&str, Option<String>)> = Vec::new();
    for &(k, v) in vars {
        old.push((k, std::env::var(k).ok()));
        // SAFETY: tests are serialized via ENV_LOCK
        unsafe { std::env::set_var(k, v) };
    }
    f();
    for (k, prev) in old {
        // SAFETY: tests are serialized via ENV_LOCK
        match prev {
            Some(v) => unsafe { std::env::set_var(k, v) },
            None => unsafe { std::env::remove_var(k) },
        }
    }
}
