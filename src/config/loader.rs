use super::Config;
use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration loader that supports multiple sources.
pub struct ConfigLoader {
    /// Path to standalone config file.
    config_file: Option<PathBuf>,
    /// Look for `cts-harness.toml` in this directory when no file is given.
    search_dir: Option<PathBuf>,
    /// Profile requested explicitly (wins over `CTS_HARNESS_PROFILE`).
    profile: Option<String>,
    /// Whether to apply `CTS_HARNESS_*` overrides.
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self {
            config_file: None,
            search_dir: None,
            profile: None,
            use_env: true,
        }
    }

    /// Set a standalone configuration file path. The file must exist.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Use `<dir>/cts-harness.toml` if it exists and no file was set.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Select a profile by name.
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into());
        self
    }

    /// Ignore `CTS_HARNESS_*` environment variables.
    pub fn no_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration from all enabled sources.
    ///
    /// Priority (later sources override earlier):
    /// 1. Default values
    /// 2. Standalone TOML file
    /// 3. Profile overlay (`--profile` or `CTS_HARNESS_PROFILE`)
    /// 4. Individual env var overrides (`CTS_HARNESS_*`)
    pub fn load(self) -> Result<Config> {
        let mut config = Config::default();
        let mut profiles: HashMap<String, serde_json::Value> = HashMap::new();

        if let Some(path) = self.resolve_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            let value = load_toml_value(&path)?;
            extract_profiles(&value, &mut profiles);
            config = serde_json::from_value(value).map_err(|e| {
                Error::config(format!("invalid config file {}: {}", path.display(), e))
            })?;
        }

        let profile_name = self
            .profile
            .clone()
            .or_else(|| self.use_env.then(super::env::get_profile_name).flatten());

        if let Some(profile_name) = profile_name {
            let profile_value = profiles.get(&profile_name).ok_or_else(|| {
                let mut available: Vec<&str> = profiles.keys().map(String::as_str).collect();
                available.sort_unstable();
                if available.is_empty() {
                    Error::config(format!(
                        "profile '{}' not found (no profiles defined)",
                        profile_name,
                    ))
                } else {
                    Error::config(format!(
                        "profile '{}' not found. Available profiles: {}",
                        profile_name,
                        available.join(", "),
                    ))
                }
            })?;

            let mut base_value = serde_json::to_value(&config)
                .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
            deep_merge(&mut base_value, profile_value);
            config = serde_json::from_value(base_value).map_err(|e| {
                Error::config(format!("failed to apply profile '{}': {}", profile_name, e))
            })?;
        }

        if self.use_env {
            super::env::apply_env_overrides(&mut config);
        }

        Ok(config)
    }

    fn resolve_file(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.config_file {
            return Some(path.clone());
        }
        self.search_dir
            .as_ref()
            .map(|dir| dir.join(super::DEFAULT_CONFIG_FILE))
            .filter(|path| path.is_file())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a TOML file into a JSON value so profiles can be merged generically.
fn load_toml_value(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(serde_json::to_value(value)?)
}

/// Extract profile definitions from a config JSON value.
///
/// Profiles live at `value["profiles"]` as `{ name: { ...config fields... } }`.
fn extract_profiles(value: &serde_json::Value, profiles: &mut HashMap<String, serde_json::Value>) {
    if let Some(serde_json::Value::Object(map)) = value.get("profiles") {
        for (name, profile_value) in map {
            profiles.insert(name.clone(), profile_value.clone());
        }
    }
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Objects: keys are merged recursively (overlay keys win for conflicts).
/// - Scalars and arrays: overlay replaces base entirely.
pub(crate) fn deep_merge(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let entry = base_map
                    .entry(key.clone())
                    .or_insert(serde_json::Value::Null);
                deep_merge(entry, overlay_val);
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShowNotes;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("cts-harness.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_standalone_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[filter]
pattern = "copy"

[device]
threads = 2

[parameters]
size = "64"
"#,
        );

        let config = ConfigLoader::new().no_env().config_file(&path).load().unwrap();
        assert_eq!(config.filter.pattern.as_deref(), Some("copy"));
        assert_eq!(config.device.threads, 2);
        assert_eq!(config.parameters.get("size").unwrap(), "64");
    }

    #[test]
    fn test_search_dir_finds_default_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "verbose = true\n");
        let config = ConfigLoader::new().no_env().search_dir(dir.path()).load().unwrap();
        assert!(config.verbose);
    }

    #[test]
    fn test_search_dir_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new().no_env().search_dir(dir.path()).load().unwrap();
        assert!(!config.verbose);
    }

    #[test]
    fn test_missing_config_file_error() {
        let result = ConfigLoader::new()
            .no_env()
            .config_file("/nonexistent/config.toml")
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "this is not valid { toml [[[");
        let result = ConfigLoader::new().no_env().config_file(&path).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[device]
threads = 2
fp64 = true

[profiles.no-fp64.device]
fp64 = false

[profiles.ci]
verbose = true
report = { show-notes = "always" }
"#,
        );

        let config = ConfigLoader::new()
            .no_env()
            .config_file(&path)
            .profile("no-fp64")
            .load()
            .unwrap();
        assert!(!config.device.fp64);
        assert_eq!(config.device.threads, 2);

        let config = ConfigLoader::new()
            .no_env()
            .config_file(&path)
            .profile("ci")
            .load()
            .unwrap();
        assert!(config.verbose);
        assert_eq!(config.report.show_notes, ShowNotes::Always);
        assert!(config.device.fp64);
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[profiles.ci]\nverbose = true\n");
        let err = ConfigLoader::new()
            .no_env()
            .config_file(&path)
            .profile("nightly")
            .load()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("profile 'nightly' not found"));
        assert!(msg.contains("ci"));
    }

    #[test]
    fn test_unknown_profile_without_profiles() {
        let err = ConfigLoader::new().no_env().profile("ci").load().unwrap_err();
        assert!(err.to_string().contains("no profiles defined"));
    }

    #[test]
    fn test_deep_merge_objects() {
        let mut base = serde_json::json!({
            "filter": { "pattern": "copy" },
            "device": { "threads": 2, "fp64": true }
        });
        let overlay = serde_json::json!({
            "device": { "fp64": false }
        });
        deep_merge(&mut base, &overlay);
        assert_eq!(base["device"]["fp64"], false);
        assert_eq!(base["device"]["threads"], 2);
        assert_eq!(base["filter"]["pattern"], "copy");
    }

    #[test]
    fn test_deep_merge_array_replaces() {
        let mut base = serde_json::json!({ "filter": { "exclude": ["a", "b"] } });
        let overlay = serde_json::json!({ "filter": { "exclude": ["c"] } });
        deep_merge(&mut base, &overlay);
        assert_eq!(base["filter"]["exclude"], serde_json::json!(["c"]));
    }

    #[test]
    fn test_extract_profiles_none() {
        let value = serde_json::json!({ "verbose": true });
        let mut profiles = HashMap::new();
        extract_profiles(&value, &mut profiles);
        assert!(profiles.is_empty());
    }
}
