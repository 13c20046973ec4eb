//! Core types for a conformance run: driver, filter, test environment, and error handling.

pub mod builder;
pub mod context;
pub mod error;
pub mod filter;

pub use builder::{Driver, DriverBuilder};
pub use context::TestEnv;
pub use error::{Error, Result};
pub use filter::TestFilter;
