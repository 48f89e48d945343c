//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod application;
pub mod event;
pub mod notification;
pub mod organisation;
pub mod user;

// Re-export commonly used models
pub use application::{
    Application, ApplicationStatus, CancellationOutcome, CreateApplicationRequest, Resolution,
};
pub use event::{
    CreateEventRequest, Event, EventCategory, EventFormat, EventStatus, UpdateEventRequest,
};
pub use notification::{CreateNotificationRequest, Notification, NotificationKind};
pub use organisation::{
    CreateOrganisationRequest, Organisation, OrganisationType, UpdateOrganisationRequest,
};
pub use user::{CreateUserRequest, Principal, Role, User};
