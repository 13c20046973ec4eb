//! Terminal output formatting for run reports.

use crate::config::ShowNotes;
use crate::logger::Status;
use std::io::{self, Write};

use super::{RunReport, TestOutcome};

/// Formats and prints run reports to the terminal.
pub struct ResultFormatter {
    show_notes: ShowNotes,
}

impl ResultFormatter {
    /// Create a new formatter with the given note display policy.
    pub fn new(show_notes: ShowNotes) -> Self {
        Self { show_notes }
    }

    /// Print the full report to stdout.
    pub fn report(&self, report: &RunReport) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_report(report, &mut out)
    }

    /// Write the full report: one line per test, failure details, and summary.
    pub fn write_report<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<()> {
        for outcome in &report.outcomes {
            self.write_case(outcome, out)?;
        }
        self.write_failures(report, out)?;
        self.write_summary(report, out)
    }

    /// Write the list of test names, one per line.
    pub fn write_list<'a, W: Write>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        out: &mut W,
    ) -> io::Result<()> {
        let mut count = 0;
        for name in names {
            writeln!(out, "{name}")?;
            count += 1;
        }
        writeln!(out, "\n{count} tests")
    }

    fn write_case<W: Write>(&self, outcome: &TestOutcome, out: &mut W) -> io::Result<()> {
        let marker = outcome.status.marker();
        match outcome.skip_reasons().next() {
            Some(reason) if outcome.status == Status::Skipped => {
                writeln!(out, "[{marker}] {}: {reason}", outcome.name())?;
            }
            _ if outcome.timed_out => {
                writeln!(out, "[{marker}] {} (timed out)", outcome.name())?;
            }
            _ => writeln!(out, "[{marker}] {}", outcome.name())?,
        }

        let show = match self.show_notes {
            ShowNotes::Always => true,
            ShowNotes::Never => false,
            ShowNotes::OnFailure => outcome.status == Status::Failed,
        };
        if show {
            for note in outcome.notes() {
                writeln!(out, "    note: {note}")?;
            }
        }
        Ok(())
    }

    fn write_failures<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<()> {
        if report.failed == 0 {
            return Ok(());
        }

        writeln!(out, "\nfailures:")?;
        for outcome in report.outcomes.iter().filter(|o| o.status == Status::Failed) {
            writeln!(out, "\n---- {} ({}) ----", outcome.name(), outcome.descriptor.source_location)?;
            for (message, location) in outcome.failures() {
                match location {
                    Some(loc) => writeln!(out, "    {message}\n        at {loc}")?,
                    None => writeln!(out, "    {message}")?,
                }
            }
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<()> {
        let status = if report.success() { "ok" } else { "FAILED" };
        writeln!(
            out,
            "\ntest result: {status}. {} passed, {} failed, {} skipped",
            report.passed, report.failed, report.skipped
        )
    }
}
