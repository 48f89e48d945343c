//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod application;
pub mod event;
pub mod notification;
pub mod organisation;
pub mod user;

// Re-export repositories
pub use application::{ApplicationRepository, APPLICATION_FILTER_COLUMNS};
pub use event::{EventRepository, EVENT_FILTER_COLUMNS};
pub use notification::{NotificationRepository, NOTIFICATION_FILTER_COLUMNS};
pub use organisation::{OrganisationRepository, ORGANISATION_FILTER_COLUMNS};
pub use user::UserRepository;
