//! cts-harness: a self-registering conformance test harness.
//!
//! Tests implement [`TestCase`], register themselves with [`register_test!`]
//! from any file of any crate that links this library, and record their
//! outcome on a [`Logger`] as pass, fail, skip or note events. The
//! [`Driver`] runs the selected tests one at a time against a [`Device`] and
//! aggregates the results into a [`RunReport`].
//!
//! # Quick Start
//!
//! ## Writing a test
//!
//! ```
//! use cts_harness::{register_test, test_descriptor};
//! use cts_harness::{CaseResult, Logger, TestCase, TestDescriptor, TestEnv};
//!
//! #[derive(Default)]
//! struct WorkGroupLimit;
//!
//! impl TestCase for WorkGroupLimit {
//!     fn descriptor(&self) -> TestDescriptor {
//!         test_descriptor!("work_group_limit")
//!     }
//!
//!     fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
//!         let max = env.device().max_work_group_size();
//!         log.check(max >= 1, || format!("max work-group size is {max}"));
//!         Ok(())
//!     }
//! }
//!
//! register_test!(WorkGroupLimit);
//! ```
//!
//! ## Running tests
//!
//! ```no_run
//! # fn main() -> cts_harness::Result<()> {
//! let report = cts_harness::driver()
//!     .from_config_file("cts-harness.toml")?
//!     .run()?;
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! Downstream crates that only register tests can use [`cts_main!`] to get
//! the full command line of the `cts-harness` binary.
//!
//! ## Covering many types
//!
//! [`coverage::for_all_types`] runs one generic check per type of a
//! [`coverage::NamedTypePack`]; see the [`coverage`] module.
//!
//! # Configuration
//!
//! ```toml
//! verbose = false
//!
//! [filter]
//! pattern = "reduction"
//! exclude = ["slow"]
//!
//! [run]
//! timeout = 60
//!
//! [report]
//! show-notes = "on-failure"
//!
//! [device]
//! threads = 4
//! sub-group-size = 16
//!
//! [parameters]
//! iterations = "8"
//!
//! [profiles.ci.run]
//! timeout = 600
//! ```
//!
//! # Features
//!
//! - `default` - Enables `cli` and `builtin-suites`
//! - `cli` - Command line entry point and log subscriber
//! - `builtin-suites` - Conformance suites for the host device

pub mod case;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod coverage;
pub mod device;
pub mod logger;
pub mod registry;
pub mod report;
#[cfg(feature = "builtin-suites")]
pub mod suites;

// Re-export commonly used types
pub use crate::case::{CaseError, CaseResult, TestCase, TestDescriptor};
pub use crate::core::{Driver, DriverBuilder, Error, Result, TestEnv, TestFilter};
pub use config::{Config, ShowNotes};
pub use device::{Capability, Device, DeviceError, HostDevice, NdRange, WorkItem};
pub use logger::{LogEvent, Logger, SourceLocation, Status};
pub use registry::{Registration, Registry, RegistryEntry};
pub use report::{RunReport, TestOutcome};

/// Create a new driver builder.
///
/// This is the main entry point for the fluent API.
///
/// # Example
///
/// ```no_run
/// use cts_harness::{driver, TestFilter};
///
/// # fn main() -> cts_harness::Result<()> {
/// let report = driver()
///     .filter(TestFilter::Substring("kernel".into()))
///     .run()?;
/// print!("{}", report.failure_details());
/// # Ok(())
/// # }
/// ```
pub fn driver<'r>() -> DriverBuilder<'r> {
    DriverBuilder::new()
}

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
