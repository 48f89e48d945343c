//! Eventra platform core
//!
//! Organisations publish events, users browse and apply to them, and
//! organisation or platform admins resolve the applications. This library
//! implements the application workflow engine with its capacity, quota and
//! authorization rules, generic query shaping for listing endpoints, and
//! best-effort notification dispatch over a realtime channel. The HTTP
//! transport consuming these services lives in a separate adapter.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventraError, Result};

// Re-export main components for easy access
pub use database::{create_pool, run_migrations, DatabasePool, QuerySpec};
pub use models::{Principal, Role};
pub use services::Services;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
