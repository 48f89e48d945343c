//! Database module
//!
//! This module handles database connections, query shaping and repositories

pub mod connection;
pub mod query;
pub mod repositories;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool, PoolConfig};
pub use query::{col, Column, ColumnKind, QueryClauses, QuerySpec};
pub use repositories::{
    ApplicationRepository, EventRepository, NotificationRepository, OrganisationRepository,
    UserRepository,
};
