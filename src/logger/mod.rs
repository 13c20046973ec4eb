//! Per-test result recording: events, source locations, and severity.
//!
//! A [`Logger`] is created fresh for every test run. Test bodies record
//! checks into it; the driver reads the final [`Status`] and event list once
//! `run` returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Where a failure was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    /// Create a location from a file path and line number.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller, propagated through `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(loc: &Location<'_>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One recorded occurrence during a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogEvent {
    Pass,
    Fail {
        message: String,
        location: Option<SourceLocation>,
    },
    Skip {
        reason: String,
    },
    Note {
        message: String,
    },
}

impl LogEvent {
    /// Severity this event contributes to the test outcome.
    pub fn severity(&self) -> Status {
        match self {
            LogEvent::Pass | LogEvent::Note { .. } => Status::Passed,
            LogEvent::Skip { .. } => Status::Skipped,
            LogEvent::Fail { .. } => Status::Failed,
        }
    }
}

/// Terminal status of a test. Ordered by severity: `Passed < Skipped < Failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Passed,
    Skipped,
    Failed,
}

impl Status {
    /// Worst status over a sequence of events. Independent of event order.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a LogEvent>) -> Self {
        events
            .into_iter()
            .map(LogEvent::severity)
            .max()
            .unwrap_or_default()
    }

    /// Short marker used in report lines.
    pub fn marker(self) -> &'static str {
        match self {
            Status::Passed => "PASS",
            Status::Skipped => "SKIP",
            Status::Failed => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Passed => "passed",
            Status::Skipped => "skipped",
            Status::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Records the checks performed by a single test run.
#[derive(Debug, Default)]
pub struct Logger {
    events: Vec<LogEvent>,
    status: Status,
}

impl Logger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, event: LogEvent) {
        self.status = self.status.max(event.severity());
        self.events.push(event);
    }

    /// Record an explicit pass.
    pub fn pass(&mut self) {
        self.record(LogEvent::Pass);
    }

    /// Record an informational message. Never changes the status.
    pub fn note(&mut self, message: impl Into<String>) {
        self.record(LogEvent::Note {
            message: message.into(),
        });
    }

    /// Record a failure at the caller's location.
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) {
        let location = SourceLocation::caller();
        self.fail_at(message, location);
    }

    /// Record a failure at an explicit location.
    pub fn fail_at(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.record(LogEvent::Fail {
            message: message.into(),
            location: Some(location),
        });
    }

    /// Record a failure with no known location (escaped errors, panics).
    pub fn fail_unlocated(&mut self, message: impl Into<String>) {
        self.record(LogEvent::Fail {
            message: message.into(),
            location: None,
        });
    }

    /// Record a skip. Does not override an earlier failure.
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.record(LogEvent::Skip {
            reason: reason.into(),
        });
    }

    /// Whether any failure has been recorded.
    pub fn has_failed(&self) -> bool {
        self.status == Status::Failed
    }

    /// Current status of the run.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Events recorded so far, in order.
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Consume the logger, returning its events.
    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    /// Fail with `message` unless `condition` holds. Returns `condition`.
    #[track_caller]
    pub fn check(&mut self, condition: bool, message: impl FnOnce() -> String) -> bool {
        if !condition {
            self.fail(message());
        }
        condition
    }

    /// Fail unless `actual == expected`. Returns whether they matched.
    #[track_caller]
    pub fn check_eq<T>(&mut self, actual: &T, expected: &T, what: &str) -> bool
    where
        T: PartialEq + fmt::Debug + ?Sized,
    {
        let matched = actual == expected;
        if !matched {
            self.fail(format!("{what}: expected {expected:?}, got {actual:?}"));
        }
        matched
    }
}
