//! Utility modules
//!
//! Common error types and logging utilities used throughout the application

pub mod errors;
pub mod logging;

pub use errors::{EventraError, Result};
