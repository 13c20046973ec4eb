use crate::device::Device;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Everything a test body can reach while it runs.
///
/// Cheap to clone; the driver hands one to every test and may move a clone
/// onto a worker thread when a timeout is configured.
#[derive(Clone)]
pub struct TestEnv {
    device: Arc<dyn Device>,
    parameters: Arc<HashMap<String, String>>,
}

impl TestEnv {
    /// Create an environment around a device with no parameters.
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self {
            device,
            parameters: Arc::new(HashMap::new()),
        }
    }

    /// Attach test parameters.
    pub fn with_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = Arc::new(parameters);
        self
    }

    /// The device under test.
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    /// Raw parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Parameter parsed as `T`, or `default` when unset or unparsable.
    pub fn param_or<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.param(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = raw, "ignoring unparsable test parameter");
                default
            }),
            None => default,
        }
    }
}

impl std::fmt::Debug for TestEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestEnv")
            .field("device", &self.device.name())
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;

    fn env() -> TestEnv {
        let mut params = HashMap::new();
        params.insert("size".to_string(), "128".to_string());
        params.insert("seed".to_string(), "abc".to_string());
        TestEnv::new(Arc::new(HostDevice::new())).with_parameters(params)
    }

    #[test]
    fn test_param_lookup() {
        let env = env();
        assert_eq!(env.param("size"), Some("128"));
        assert_eq!(env.param("missing"), None);
    }

    #[test]
    fn test_param_or_parses_and_falls_back() {
        let env = env();
        assert_eq!(env.param_or("size", 0usize), 128);
        assert_eq!(env.param_or("seed", 7u32), 7);
        assert_eq!(env.param_or("missing", 9u32), 9);
    }

    #[test]
    fn test_device_access() {
        assert_eq!(env().device().name(), "host");
    }
}
