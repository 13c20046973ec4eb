//! Per-test outcomes and the aggregate run report.

mod formatter;

pub use formatter::ResultFormatter;

use crate::case::TestDescriptor;
use crate::core::error::Result;
use crate::logger::{LogEvent, SourceLocation, Status};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Result of running one test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub descriptor: TestDescriptor,
    pub status: Status,
    pub events: Vec<LogEvent>,
    pub duration: Duration,
    /// The test did not finish before the configured timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl TestOutcome {
    /// Build an outcome from the events a test recorded.
    pub fn from_events(
        descriptor: TestDescriptor,
        events: Vec<LogEvent>,
        duration: Duration,
        timed_out: bool,
    ) -> Self {
        let status = Status::from_events(&events);
        Self {
            descriptor,
            status,
            events,
            duration,
            timed_out,
        }
    }

    /// Name of the test.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Recorded failures, in order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, Option<&SourceLocation>)> {
        self.events.iter().filter_map(|e| match e {
            LogEvent::Fail { message, location } => Some((message.as_str(), location.as_ref())),
            _ => None,
        })
    }

    /// Recorded skip reasons, in order.
    pub fn skip_reasons(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            LogEvent::Skip { reason } => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Recorded notes, in order.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            LogEvent::Note { message } => Some(message.as_str()),
            _ => None,
        })
    }
}

/// Aggregate over every executed test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<TestOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunReport {
    /// Aggregate outcomes, preserving their order.
    pub fn from_outcomes(outcomes: Vec<TestOutcome>) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        let passed = count(Status::Passed);
        let failed = count(Status::Failed);
        let skipped = count(Status::Skipped);
        Self {
            outcomes,
            passed,
            failed,
            skipped,
        }
    }

    /// Number of executed tests.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// No executed test failed. Skips do not count against success.
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }

    /// Outcome of the named test, if it ran.
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name() == name)
    }

    /// One line per recorded failure: `name: message (file:line)`.
    pub fn failure_details(&self) -> String {
        let mut out = String::new();
        for outcome in self.outcomes.iter().filter(|o| o.status == Status::Failed) {
            for (message, location) in outcome.failures() {
                let _ = match location {
                    Some(loc) => writeln!(out, "{}: {} ({})", outcome.name(), message, loc),
                    None => writeln!(out, "{}: {}", outcome.name(), message),
                };
            }
        }
        out
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
