//! Services module
//!
//! This module contains business logic services

pub mod application;
pub mod event;
pub mod notification;
pub mod organisation;
pub mod realtime;

// Re-export commonly used services
pub use application::ApplicationService;
pub use event::EventService;
pub use notification::NotificationService;
pub use organisation::OrganisationService;
pub use realtime::{InProcessChannel, NullChannel, OutboundMessage, RealtimeChannel};

use std::sync::Arc;

use crate::config::Settings;
use crate::database::{
    ApplicationRepository, DatabasePool, EventRepository, NotificationRepository,
    OrganisationRepository, UserRepository,
};

/// Service factory wiring repositories, the realtime channel and all
/// services together from a connection pool
#[derive(Clone)]
pub struct Services {
    pub applications: ApplicationService,
    pub events: EventService,
    pub organisations: OrganisationService,
    pub notifications: NotificationService,
    pub realtime: Arc<InProcessChannel>,
}

impl Services {
    /// Create all services with an in-process realtime channel
    pub fn new(pool: DatabasePool, settings: Settings) -> Self {
        let realtime = Arc::new(InProcessChannel::new(settings.realtime.broadcast_capacity));
        Self::with_channel(pool, settings, realtime)
    }

    /// Create all services sharing a caller-provided realtime channel
    pub fn with_channel(
        pool: DatabasePool,
        settings: Settings,
        realtime: Arc<InProcessChannel>,
    ) -> Self {
        let users = UserRepository::new(pool.clone());
        let organisations = OrganisationRepository::new(pool.clone());
        let events = EventRepository::new(pool.clone());
        let applications = ApplicationRepository::new(pool.clone());
        let notification_rows = NotificationRepository::new(pool);

        let notifications = NotificationService::new(
            notification_rows,
            users.clone(),
            realtime.clone() as Arc<dyn RealtimeChannel>,
            settings.clone(),
        );

        let application_service = ApplicationService::new(
            applications,
            events.clone(),
            organisations.clone(),
            notifications.clone(),
            settings.clone(),
        );

        let event_service = EventService::new(
            events,
            organisations.clone(),
            notifications.clone(),
            settings.clone(),
        );

        let organisation_service = OrganisationService::new(organisations, users, settings);

        Self {
            applications: application_service,
            events: event_service,
            organisations: organisation_service,
            notifications,
            realtime,
        }
    }
}
