use crate::registry::RegistryError;

/// Result type alias for cts-harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cts-harness.
///
/// Every variant describes a problem with the harness itself or its
/// environment. Problems with the device under test are recorded as test
/// outcomes instead and never surface here, except for [`Error::Startup`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidConfig { field: String, value: String },

    /// The test catalog is inconsistent (e.g. duplicate names).
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An exact-name filter did not match any registered test.
    #[error("No registered test named '{0}'")]
    TestNotFound(String),

    /// A named type pack was given the wrong number of labels.
    #[error("Type pack has {expected} types but {actual} labels")]
    TypePack { expected: usize, actual: usize },

    /// The device under test could not be brought up at all.
    #[error("Startup failure: {0}")]
    Startup(String),

    /// A test-name pattern failed to compile.
    #[error("Invalid test pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid configuration value error.
    pub fn invalid_config(field: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a startup failure.
    pub fn startup(msg: impl Into<String>) -> Self {
        Error::Startup(msg.into())
    }

    /// Whether this error means the harness is misconfigured, as opposed to
    /// the device being unreachable or the host failing.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::InvalidConfig { .. }
                | Error::Registry(_)
                | Error::TestNotFound(_)
                | Error::TypePack { .. }
                | Error::InvalidPattern(_)
                | Error::TomlDe(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            Error::config("bad value").to_string(),
            "Configuration error: bad value"
        );
        assert_eq!(
            Error::startup("no device").to_string(),
            "Startup failure: no device"
        );
        assert_eq!(
            Error::TestNotFound("kernel_copy".to_string()).to_string(),
            "No registered test named 'kernel_copy'"
        );
        assert_eq!(
            Error::TypePack {
                expected: 3,
                actual: 2
            }
            .to_string(),
            "Type pack has 3 types but 2 labels"
        );
    }

    #[test]
    fn test_error_invalid_config() {
        let err = Error::invalid_config("report.show-notes", "sometimes");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for report.show-notes: sometimes"
        );
    }

    #[test]
    fn test_error_registry_duplicate() {
        let err: Error = RegistryError::Duplicate {
            name: "a".to_string(),
            first: "tests/a.rs".to_string(),
            second: "tests/b.rs".to_string(),
        }
        .into();
        assert!(err.to_string().contains("duplicate test name 'a'"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_startup_is_not_configuration() {
        assert!(!Error::startup("gone").is_configuration());
        assert!(Error::config("x").is_configuration());
    }
}
