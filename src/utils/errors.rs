//! Error handling for Eventra
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Operational errors are
//! expected, client-facing failures; everything else is infrastructure.

use thiserror::Error;

/// Main error type for the Eventra platform core
#[derive(Error, Debug)]
pub enum EventraError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Application not found: {application_id}")]
    ApplicationNotFound { application_id: i64 },

    #[error("Organisation not found: {organisation_id}")]
    OrganisationNotFound { organisation_id: i64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Registration for this event has closed")]
    RegistrationClosed,

    #[error("Daily application limit of {limit} reached, try again tomorrow")]
    RateLimited { limit: u32 },

    #[error("Event has reached its capacity")]
    CapacityExceeded,

    #[error("An active application for this event already exists")]
    DuplicateApplication,

    #[error("An organisation with this email already exists")]
    DuplicateOrganisation,

    #[error("Application has already been processed")]
    AlreadyProcessed,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Eventra operations
pub type Result<T> = std::result::Result<T, EventraError>;

impl EventraError {
    /// Operational errors are expected and map to client-facing responses;
    /// non-operational ones surface as a generic internal failure at the
    /// transport boundary.
    pub fn is_operational(&self) -> bool {
        !matches!(
            self,
            EventraError::Database(_)
                | EventraError::Migration(_)
                | EventraError::Config(_)
                | EventraError::Serialization(_)
        )
    }

    /// Stable machine-readable code for transport adapters
    pub fn code(&self) -> &'static str {
        match self {
            EventraError::Database(_) => "internal",
            EventraError::Migration(_) => "internal",
            EventraError::Config(_) => "internal",
            EventraError::Serialization(_) => "internal",
            EventraError::EventNotFound { .. } => "event_not_found",
            EventraError::ApplicationNotFound { .. } => "application_not_found",
            EventraError::OrganisationNotFound { .. } => "organisation_not_found",
            EventraError::UserNotFound { .. } => "user_not_found",
            EventraError::InvalidState(_) => "invalid_state",
            EventraError::RegistrationClosed => "registration_closed",
            EventraError::RateLimited { .. } => "rate_limited",
            EventraError::CapacityExceeded => "capacity_exceeded",
            EventraError::DuplicateApplication => "duplicate_application",
            EventraError::DuplicateOrganisation => "duplicate_organisation",
            EventraError::AlreadyProcessed => "already_processed",
            EventraError::Forbidden(_) => "forbidden",
            EventraError::InvalidInput(_) => "invalid_input",
        }
    }

    /// Errors a client is expected to retry later rather than treat as final
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EventraError::RateLimited { .. } | EventraError::CapacityExceeded
        )
    }
}
