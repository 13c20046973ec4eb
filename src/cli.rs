//! Command line entry point shared by the `cts-harness` binary and [`cts_main!`](crate::cts_main).
//!
//! Exit codes:
//!
//! - `0` every executed test passed (skips allowed)
//! - `1` at least one test failed
//! - `2` the harness could not run (bad configuration, duplicate test names,
//!   unusable device, unknown exact test name)

use crate::config::{Config, ConfigLoader, ShowNotes, env};
use crate::core::builder::DriverBuilder;
use crate::core::error::{Error, Result};
use crate::report::ResultFormatter;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, Registry, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Exit code for harness errors, as opposed to test failures.
pub const EXIT_HARNESS_ERROR: u8 = 2;

/// Run registered conformance tests
#[derive(Parser, Debug)]
#[command(name = "cts-harness")]
#[command(version)]
#[command(about = "Run registered conformance tests", long_about = None)]
pub struct Cli {
    /// Run only tests whose name contains FILTER
    #[arg(value_name = "FILTER")]
    pub filter: Option<String>,

    /// Match FILTER against the whole test name
    #[arg(long)]
    pub exact: bool,

    /// Treat FILTER as a regular expression
    #[arg(long, conflicts_with = "exact")]
    pub regex: bool,

    /// Skip tests whose name contains PATTERN (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// List selected tests without running them
    #[arg(long)]
    pub list: bool,

    /// Configuration file (default: ./cts-harness.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Per-test timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Host device worker threads (0 = one per CPU)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// When to print test notes: always, never, on-failure
    #[arg(long, value_name = "POLICY")]
    pub show_notes: Option<ShowNotes>,

    /// Write the run report as JSON to PATH
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load configuration from file, profile and environment, then apply flags.
    pub fn load_config(&self) -> Result<Config> {
        let mut loader = ConfigLoader::new();
        loader = match &self.config {
            Some(path) => loader.config_file(path),
            None => loader.search_dir(std::env::current_dir()?),
        };
        if let Some(profile) = &self.profile {
            loader = loader.profile(profile);
        }

        let mut config = loader.load()?;
        self.apply_to(&mut config);
        Ok(config)
    }

    /// Apply command line flags on top of `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(filter) = &self.filter {
            config.filter.pattern = Some(filter.clone());
        }
        if self.exact {
            config.filter.exact = true;
            config.filter.regex = false;
        }
        if self.regex {
            config.filter.regex = true;
            config.filter.exact = false;
        }
        config.filter.exclude.extend(self.exclude.iter().cloned());

        if let Some(timeout) = self.timeout {
            config.run.timeout = Some(timeout);
        }
        if let Some(threads) = self.threads {
            config.device.threads = threads;
        }
        if let Some(show_notes) = self.show_notes {
            config.report.show_notes = show_notes;
        }
        if let Some(json) = &self.json {
            config.report.json = Some(json.clone());
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

/// Parse the process arguments and run.
pub fn main() -> ExitCode {
    run(Cli::parse())
}

/// Run with already-parsed arguments, reporting harness errors on stderr.
pub fn run(cli: Cli) -> ExitCode {
    let logging = init_tracing(cli.verbose);
    match execute(&cli, logging.as_ref()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = failure_hint(&e) {
                eprintln!("note: {hint}");
            }
            ExitCode::from(EXIT_HARNESS_ERROR)
        }
    }
}

fn execute(cli: &Cli, logging: Option<&FilterHandle>) -> Result<ExitCode> {
    let config = cli.load_config()?;
    if config.verbose {
        if let Some(handle) = logging.filter(|_| !cli.verbose) {
            if let Err(e) = handle.reload(env_filter(true)) {
                tracing::warn!("could not raise the log level: {e}");
            }
        }
        for (key, value) in env::detect_active_overrides() {
            tracing::info!("env override {key}={value}");
        }
    }

    let driver = DriverBuilder::new().with_config(config).build()?;
    let formatter = ResultFormatter::new(driver.config().report.show_notes);

    if cli.list {
        let tests = driver.list()?;
        formatter.write_list(tests.iter().map(|d| d.name.as_str()), &mut io::stdout().lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = driver.run_all()?;
    formatter.report(&report)?;

    if let Some(path) = &driver.config().report.json {
        report.write_json(path)?;
        tracing::debug!(path = %path.display(), "wrote JSON report");
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// What to tell the user, beyond the error itself, when the harness could not run.
fn failure_hint(e: &Error) -> Option<&'static str> {
    if e.is_configuration() {
        Some("no tests were run; check cts-harness.toml, CTS_HARNESS_* variables and flags")
    } else if matches!(e, Error::Startup(_)) {
        Some("no tests were run; the device could not be used")
    } else {
        None
    }
}

/// `RUST_LOG` when set, otherwise `warn`, or `debug` when verbose.
fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the log subscriber before any configuration is read.
///
/// The returned handle lets `verbose = true` from the configuration raise the
/// level afterwards. `None` if a subscriber was already installed.
fn init_tracing(verbose: bool) -> Option<FilterHandle> {
    let (filter, handle) = reload::Layer::new(env_filter(verbose));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .ok()?;
    Some(handle)
}

/// Generate a `main` that runs every test registered in the final binary.
///
/// ```no_run
/// cts_harness::cts_main!();
/// ```
#[macro_export]
macro_rules! cts_main {
    () => {
        fn main() -> ::std::process::ExitCode {
            $crate::cli::main()
        }
    };
}
