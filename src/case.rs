//! The test case contract every conformance check implements.

use crate::core::context::TestEnv;
use crate::device::DeviceError;
use crate::logger::Logger;
use serde::{Deserialize, Serialize};

/// Identity of a test, used for reporting and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Unique name within the registry.
    pub name: String,
    /// Source file that defines the test.
    pub source_location: String,
}

impl TestDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, source_location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_location: source_location.into(),
        }
    }
}

/// Build a [`TestDescriptor`] for the current source file.
///
/// ```
/// let info = cts_harness::test_descriptor!("my_check");
/// assert_eq!(info.name, "my_check");
/// assert!(info.source_location.ends_with(".rs"));
/// ```
#[macro_export]
macro_rules! test_descriptor {
    ($name:expr) => {
        $crate::case::TestDescriptor::new($name, file!())
    };
}

/// An error that escaped a test body.
///
/// The driver records it as a single failure for the test. Checks that are
/// expected to fail should be recorded on the [`Logger`] instead.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// The device returned an error the test did not expect.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Harness-level error raised inside the test (e.g. a bad type pack).
    #[error(transparent)]
    Harness(#[from] crate::core::error::Error),

    /// Any other unexpected condition.
    #[error("{0}")]
    Other(String),
}

impl CaseError {
    /// Create an error from a message.
    pub fn other(msg: impl Into<String>) -> Self {
        CaseError::Other(msg.into())
    }
}

/// Result returned by [`TestCase::run`].
pub type CaseResult = std::result::Result<(), CaseError>;

/// A single conformance check.
///
/// Implementors are registered with [`register_test!`](crate::register_test)
/// and must be `Default`-constructible.
pub trait TestCase {
    /// Describe this test. Must be pure and callable before [`run`](Self::run).
    fn descriptor(&self) -> TestDescriptor;

    /// Perform the check, recording results on `log`.
    ///
    /// Any thread or device work started here must finish before returning.
    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult;
}
