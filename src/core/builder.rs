use crate::case::TestDescriptor;
use crate::config::{Config, ConfigLoader};
use crate::core::context::TestEnv;
use crate::core::error::{Error, Result};
use crate::core::filter::TestFilter;
use crate::device::{Device, HostDevice};
use crate::logger::{LogEvent, Logger};
use crate::registry::{self, Factory, Registry, RegistryEntry};
use crate::report::{RunReport, TestOutcome};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Builder for configuring and running a conformance run.
pub struct DriverBuilder<'r> {
    config: Option<Config>,
    registry: Option<&'r Registry>,
    device: Option<Arc<dyn Device>>,
    filter: Option<TestFilter>,
    exclude: Vec<String>,
    timeout: Option<Duration>,
}

impl<'r> DriverBuilder<'r> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: None,
            registry: None,
            device: None,
            filter: None,
            exclude: Vec::new(),
            timeout: None,
        }
    }

    /// Set the configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from a standalone TOML file.
    pub fn from_config_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let config = ConfigLoader::new().config_file(path).load()?;
        self.config = Some(config);
        Ok(self)
    }

    /// Run the tests of `registry` instead of the global one.
    pub fn registry(mut self, registry: &'r Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the device under test.
    pub fn device<D: Device + 'static>(mut self, device: D) -> Self {
        self.device = Some(Arc::new(device));
        self
    }

    /// Set the device under test from a shared handle.
    pub fn shared_device(mut self, device: Arc<dyn Device>) -> Self {
        self.device = Some(device);
        self
    }

    /// Select tests with `filter`, overriding the configured pattern.
    pub fn filter(mut self, filter: TestFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Skip tests whose name contains `pattern`, in addition to configured excludes.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Limit how long a single test may run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // --- Build and Execute ---

    /// Build the driver.
    pub fn build(self) -> Result<Driver<'r>> {
        let config = self.config.unwrap_or_default();

        let registry = match self.registry {
            Some(r) => r,
            None => registry::global()?,
        };

        let filter = match self.filter {
            Some(f) => f,
            None => TestFilter::from_config(&config.filter)?,
        };

        let mut exclude = config.filter.exclude.clone();
        exclude.extend(self.exclude);
        exclude.retain(|p| !p.is_empty());

        let timeout = self
            .timeout
            .or_else(|| config.run.timeout.map(Duration::from_secs));
        if timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config("run.timeout", "0"));
        }

        // Create device from config if not explicitly set
        let device = match self.device {
            Some(d) => d,
            None => Arc::new(HostDevice::from_config(&config.device)),
        };

        let env = TestEnv::new(device).with_parameters(config.parameters.clone());

        Ok(Driver {
            config,
            registry,
            env,
            filter,
            exclude,
            timeout,
        })
    }

    /// Build and immediately run every selected test.
    pub fn run(self) -> Result<RunReport> {
        self.build()?.run_all()
    }
}

impl Default for DriverBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs registered tests one at a time and aggregates their outcomes.
pub struct Driver<'r> {
    config: Config,
    registry: &'r Registry,
    env: TestEnv,
    filter: TestFilter,
    exclude: Vec<String>,
    timeout: Option<Duration>,
}

impl<'r> Driver<'r> {
    /// Configuration the driver was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Environment handed to every test.
    pub fn env(&self) -> &TestEnv {
        &self.env
    }

    /// Per-test timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Descriptors of the tests the configured filter selects, in run order.
    pub fn list(&self) -> Result<Vec<&'r TestDescriptor>> {
        Ok(self
            .select(&self.filter)?
            .into_iter()
            .map(RegistryEntry::descriptor)
            .collect())
    }

    /// Run every test the configured filter selects.
    pub fn run_all(&self) -> Result<RunReport> {
        self.run_filtered(&self.filter)
    }

    /// Run every test `filter` selects.
    ///
    /// Only a device that fails validation or an unresolvable filter stops the
    /// run; anything a test does is recorded in its outcome.
    pub fn run_filtered(&self, filter: &TestFilter) -> Result<RunReport> {
        let device = self.env.device();
        device.validate().map_err(|e| {
            Error::startup(format!("device '{}' is unusable: {e}", device.name()))
        })?;

        let selected = self.select(filter)?;
        tracing::info!(
            device = device.name(),
            selected = selected.len(),
            registered = self.registry.len(),
            "starting conformance run"
        );

        let outcomes: Vec<TestOutcome> =
            selected.into_iter().map(|entry| self.run_entry(entry)).collect();
        let report = RunReport::from_outcomes(outcomes);

        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "conformance run finished"
        );
        Ok(report)
    }

    fn select(&self, filter: &TestFilter) -> Result<Vec<&'r RegistryEntry>> {
        let candidates: Vec<&'r RegistryEntry> = match filter {
            TestFilter::Exact(name) => {
                let entry = self
                    .registry
                    .find(name)
                    .ok_or_else(|| Error::TestNotFound(name.clone()))?;
                vec![entry]
            }
            _ => self
                .registry
                .enumerate()
                .iter()
                .filter(|e| filter.matches(e.name()))
                .collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|e| !self.exclude.iter().any(|p| e.name().contains(p.as_str())))
            .collect())
    }

    fn run_entry(&self, entry: &RegistryEntry) -> TestOutcome {
        let name = entry.name();
        tracing::debug!(test = name, "running test");

        let start = Instant::now();
        let (events, timed_out) = match self.timeout {
            Some(limit) => run_with_timeout(name, entry.factory(), &self.env, limit),
            None => (execute(entry.factory(), &self.env).into_events(), false),
        };
        let outcome =
            TestOutcome::from_events(entry.descriptor().clone(), events, start.elapsed(), timed_out);

        tracing::debug!(
            test = name,
            status = %outcome.status,
            elapsed_ms = outcome.duration.as_millis() as u64,
            "finished test"
        );
        outcome
    }
}

/// Construct and run one test with a fresh logger, folding escaped errors and
/// panics into a failure.
fn execute(factory: Factory, env: &TestEnv) -> Logger {
    let mut log = Logger::new();
    let result = panic::catch_unwind(AssertUnwindSafe(|| factory().run(env, &mut log)));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!("test returned an error: {e}");
            log.fail_unlocated(format!("unexpected error: {e}"));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("test panicked: {message}");
            log.fail_unlocated(format!("panicked: {message}"));
        }
    }
    log
}

/// Run a test on a worker thread and wait at most `limit` for it.
///
/// A worker that misses the deadline is detached; its events are lost and
/// the outcome is a single timeout failure.
fn run_with_timeout(
    name: &str,
    factory: Factory,
    env: &TestEnv,
    limit: Duration,
) -> (Vec<LogEvent>, bool) {
    let (tx, rx) = mpsc::channel();
    let worker_env = env.clone();

    let spawned = std::thread::Builder::new()
        .name(format!("cts-{name}"))
        .spawn(move || {
            let _ = tx.send(execute(factory, &worker_env));
        });

    let handle = match spawned {
        Ok(h) => h,
        Err(e) => {
            let mut log = Logger::new();
            log.fail_unlocated(format!("failed to spawn test thread: {e}"));
            return (log.into_events(), false);
        }
    };

    match rx.recv_timeout(limit) {
        Ok(log) => {
            let _ = handle.join();
            (log.into_events(), false)
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(test = name, "test timed out after {limit:?}");
            let mut log = Logger::new();
            log.fail_unlocated(format!("timed out after {limit:?}"));
            (log.into_events(), true)
        }
        Err(RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            let mut log = Logger::new();
            log.fail_unlocated("test thread exited without reporting");
            (log.into_events(), false)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseError, CaseResult, TestCase};
    use crate::config::FilterConfig;
    use crate::device::DeviceError;
    use crate::logger::Status;

    macro_rules! case {
        ($ty:ident, $name:literal, |$log:ident| $body:expr) => {
            #[derive(Default)]
            struct $ty;

            impl TestCase for $ty {
                fn descriptor(&self) -> TestDescriptor {
                    TestDescriptor::new($name, file!())
                }

                fn run(&self, _env: &TestEnv, $log: &mut Logger) -> CaseResult {
                    $body
                }
            }
        };
    }

    case!(Passes, "passes", |log| {
        log.pass();
        Ok(())
    });
    case!(Fails, "fails", |log| {
        log.fail("x != y");
        Ok(())
    });
    case!(Skips, "skips", |log| {
        log.skip("feature unsupported");
        Ok(())
    });
    case!(Panics, "panics", |_log| panic!("boom"));
    case!(Errors, "errors", |_log| Err(CaseError::from(DeviceError::Unavailable(
        "gone".into()
    ))));

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.register(RegistryEntry::of::<Passes>()).unwrap();
        r.register(RegistryEntry::of::<Fails>()).unwrap();
        r.register(RegistryEntry::of::<Skips>()).unwrap();
        r.register(RegistryEntry::of::<Panics>()).unwrap();
        r.register(RegistryEntry::of::<Errors>()).unwrap();
        r
    }

    #[test]
    fn test_run_all_isolates_failures() {
        let reg = registry();
        let report = DriverBuilder::new().registry(&reg).run().unwrap();
        assert_eq!(report.total(), 5);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 3);
        assert_eq!(report.skipped, 1);

        let panicked = report.outcome("panics").unwrap();
        assert_eq!(panicked.status, Status::Failed);
        assert!(panicked.failures().any(|(m, _)| m == "panicked: boom"));

        let errored = report.outcome("errors").unwrap();
        assert!(errored
            .failures()
            .any(|(m, _)| m.starts_with("unexpected error: device error")));
    }

    #[test]
    fn test_builder_filter_overrides_config() {
        let reg = registry();
        let config = Config {
            filter: FilterConfig {
                pattern: Some("fails".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let driver = DriverBuilder::new()
            .registry(&reg)
            .with_config(config)
            .filter(TestFilter::Substring("pass".into()))
            .build()
            .unwrap();
        let names: Vec<_> = driver.list().unwrap().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["passes"]);
    }

    #[test]
    fn test_exact_filter_missing_name() {
        let reg = registry();
        let driver = DriverBuilder::new()
            .registry(&reg)
            .filter(TestFilter::Exact("nope".into()))
            .build()
            .unwrap();
        assert!(matches!(driver.run_all(), Err(Error::TestNotFound(n)) if n == "nope"));
    }

    #[test]
    fn test_exclude() {
        let reg = registry();
        let driver = DriverBuilder::new()
            .registry(&reg)
            .exclude("s")
            .build()
            .unwrap();
        let names: Vec<_> = driver.list().unwrap().iter().map(|d| d.name.clone()).collect();
        assert!(names.is_empty());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let reg = registry();
        let result = DriverBuilder::new()
            .registry(&reg)
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_timeout_path_keeps_events() {
        let reg = registry();
        let report = DriverBuilder::new()
            .registry(&reg)
            .timeout(Duration::from_secs(30))
            .run()
            .unwrap();
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 3);
        assert!(report.outcomes.iter().all(|o| !o.timed_out));
        assert!(report
            .outcome("fails")
            .unwrap()
            .failures()
            .any(|(m, loc)| m == "x != y" && loc.is_some()));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
