//! Test selection by name.

use crate::config::FilterConfig;
use crate::core::error::Result;
use regex::Regex;

/// Selects which registered tests run.
#[derive(Debug, Clone, Default)]
pub enum TestFilter {
    /// Every test.
    #[default]
    All,
    /// Names containing the substring.
    Substring(String),
    /// Exactly one name; resolved through [`Registry::find`](crate::registry::Registry::find).
    Exact(String),
    /// Names matching the regular expression.
    Pattern(Regex),
}

impl TestFilter {
    /// Build a filter from configuration.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let Some(pattern) = config.pattern.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(TestFilter::All);
        };

        if config.exact {
            Ok(TestFilter::Exact(pattern.to_string()))
        } else if config.regex {
            Ok(TestFilter::Pattern(Regex::new(pattern)?))
        } else {
            Ok(TestFilter::Substring(pattern.to_string()))
        }
    }

    /// Whether `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            TestFilter::All => true,
            TestFilter::Substring(s) => name.contains(s.as_str()),
            TestFilter::Exact(s) => name == s,
            TestFilter::Pattern(re) => re.is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pattern: &str, exact: bool, regex: bool) -> FilterConfig {
        FilterConfig {
            pattern: Some(pattern.to_string()),
            exact,
            regex,
            exclude: Vec::new(),
        }
    }

    #[test]
    fn test_no_pattern_selects_all() {
        let filter = TestFilter::from_config(&FilterConfig::default()).unwrap();
        assert!(matches!(filter, TestFilter::All));
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_empty_pattern_selects_all() {
        let filter = TestFilter::from_config(&config("", false, false)).unwrap();
        assert!(matches!(filter, TestFilter::All));
    }

    #[test]
    fn test_substring_filter() {
        let filter = TestFilter::from_config(&config("reduc", false, false)).unwrap();
        assert!(filter.matches("reduction_sum"));
        assert!(!filter.matches("kernel_copy"));
    }

    #[test]
    fn test_exact_filter() {
        let filter = TestFilter::from_config(&config("kernel_copy", true, false)).unwrap();
        assert!(filter.matches("kernel_copy"));
        assert!(!filter.matches("kernel_copy_vec"));
    }

    #[test]
    fn test_regex_filter() {
        let filter = TestFilter::from_config(&config("^(kernel|device)_", false, true)).unwrap();
        assert!(filter.matches("kernel_copy"));
        assert!(filter.matches("device_capabilities"));
        assert!(!filter.matches("reduction_sum"));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let err = TestFilter::from_config(&config("[invalid", false, true)).unwrap_err();
        assert!(err.to_string().contains("Invalid test pattern"));
    }
}
