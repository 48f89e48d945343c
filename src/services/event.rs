//! Event lifecycle service
//!
//! Owns event creation invariants and the closed status-transition table.
//! Publishing an event triggers the platform-wide new-event fan-out as a
//! best-effort side effect.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::database::repositories::EVENT_FILTER_COLUMNS;
use crate::database::{EventRepository, OrganisationRepository, QuerySpec};
use crate::models::event::{CreateEventRequest, Event, EventStatus, UpdateEventRequest};
use crate::models::user::{Principal, Role};
use crate::services::notification::NotificationService;
use crate::utils::errors::{EventraError, Result};

const MIN_CAPACITY: i32 = 5;

#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    organisations: OrganisationRepository,
    notifications: NotificationService,
    settings: Settings,
}

impl EventService {
    pub fn new(
        events: EventRepository,
        organisations: OrganisationRepository,
        notifications: NotificationService,
        settings: Settings,
    ) -> Self {
        Self {
            events,
            organisations,
            notifications,
            settings,
        }
    }

    /// Create a new event in draft status
    pub async fn create_event(
        &self,
        principal: Principal,
        request: CreateEventRequest,
    ) -> Result<Event> {
        let organisation = self
            .organisations
            .find_by_id(request.organisation_id)
            .await?
            .ok_or(EventraError::OrganisationNotFound {
                organisation_id: request.organisation_id,
            })?;

        self.authorize_for(principal, organisation.id).await?;
        validate_event_request(&request)?;

        let event = self.events.create(request).await?;
        info!(
            event_id = event.id,
            organisation_id = organisation.id,
            actor_id = principal.id,
            "Event created"
        );

        Ok(event)
    }

    /// Update draft-editable fields
    pub async fn update_event(
        &self,
        principal: Principal,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;

        if event.status != EventStatus::Draft.as_str() {
            return Err(EventraError::InvalidState(format!(
                "Only draft events can be edited, event is '{}'",
                event.status
            )));
        }

        validate_event_update(&event, &request)?;

        self.events.update(event_id, request).await
    }

    /// Publish a draft event and fan the announcement out to all users
    pub async fn publish_event(&self, principal: Principal, event_id: i64) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;

        let published = self
            .transition(event_id, EventStatus::Published)
            .await?;

        let organisation = self
            .organisations
            .find_by_id(published.organisation_id)
            .await?;

        match organisation {
            Some(organisation) => {
                if let Err(e) = self
                    .notifications
                    .notify_new_event(&published, &organisation)
                    .await
                {
                    warn!(event_id = event_id, error = %e, "Failed to dispatch new-event notifications");
                }
            }
            None => {
                warn!(
                    event_id = event_id,
                    organisation_id = published.organisation_id,
                    "Owning organisation vanished before notification fan-out"
                );
            }
        }

        Ok(published)
    }

    /// Move a published event into its running state
    pub async fn start_event(&self, principal: Principal, event_id: i64) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;
        self.transition(event_id, EventStatus::Ongoing).await
    }

    /// Mark a running event completed
    pub async fn complete_event(&self, principal: Principal, event_id: i64) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;
        self.transition(event_id, EventStatus::Completed).await
    }

    /// Cancel an event from any pre-completed state
    pub async fn cancel_event(&self, principal: Principal, event_id: i64) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;
        self.transition(event_id, EventStatus::Cancelled).await
    }

    /// Delete an event along with its applications
    pub async fn delete_event(&self, principal: Principal, event_id: i64) -> Result<()> {
        let event = self.get_event(event_id).await?;
        self.authorize_for(principal, event.organisation_id).await?;

        self.events.delete(event_id).await?;
        info!(event_id = event_id, actor_id = principal.id, "Event deleted");
        Ok(())
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(EventraError::EventNotFound { event_id })
    }

    /// List events shaped by untrusted parameters, with accurate total
    pub async fn list_events(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Event>, i64)> {
        let spec = QuerySpec::new(EVENT_FILTER_COLUMNS)
            .with_page_size(
                self.settings.limits.default_page_size,
                self.settings.limits.max_page_size,
            )
            .shape(params);

        let events = self.events.list(&spec).await?;
        let total = self.events.count(&spec).await?;
        Ok((events, total))
    }

    /// Validate and apply a status transition via a conditional update so
    /// concurrent transitions never clobber each other
    async fn transition(&self, event_id: i64, to: EventStatus) -> Result<Event> {
        let event = self.get_event(event_id).await?;
        let from = event.status()?;

        if !from.can_transition_to(to) {
            return Err(EventraError::InvalidState(format!(
                "Cannot move event from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            )));
        }

        let updated = self
            .events
            .transition_status(event_id, from, to)
            .await?
            .ok_or_else(|| {
                EventraError::InvalidState(format!(
                    "Event left status '{}' before the transition applied",
                    from.as_str()
                ))
            })?;

        info!(
            event_id = event_id,
            from = from.as_str(),
            to = to.as_str(),
            "Event status transition"
        );

        Ok(updated)
    }

    async fn authorize_for(&self, principal: Principal, organisation_id: i64) -> Result<()> {
        match principal.role {
            Role::Admin => Ok(()),
            Role::Organisation => {
                if self
                    .organisations
                    .is_admin(organisation_id, principal.id)
                    .await?
                {
                    Ok(())
                } else {
                    Err(EventraError::Forbidden(
                        "Not an admin of the owning organisation".to_string(),
                    ))
                }
            }
            Role::User => Err(EventraError::Forbidden(
                "Users cannot manage events".to_string(),
            )),
        }
    }
}

fn validate_event_request(request: &CreateEventRequest) -> Result<()> {
    if request.capacity < MIN_CAPACITY {
        return Err(EventraError::InvalidInput(format!(
            "Event capacity must be at least {}",
            MIN_CAPACITY
        )));
    }

    if request.end_date <= request.start_date {
        return Err(EventraError::InvalidInput(
            "Event end date must be after the start date".to_string(),
        ));
    }

    if let Some(registration_end) = request.registration_end {
        if registration_end >= request.start_date {
            return Err(EventraError::InvalidInput(
                "Registration must close before the event starts".to_string(),
            ));
        }
        if registration_end <= Utc::now() {
            return Err(EventraError::InvalidInput(
                "Registration end must be in the future".to_string(),
            ));
        }
    }

    if let (Some(start), Some(end)) = (request.registration_start, request.registration_end) {
        if end <= start {
            return Err(EventraError::InvalidInput(
                "Registration window must end after it starts".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate the values an edit would leave in place, so a bad draft edit fails
/// as an input error instead of tripping a database constraint
fn validate_event_update(event: &Event, request: &UpdateEventRequest) -> Result<()> {
    let capacity = request.capacity.unwrap_or(event.capacity);
    if capacity < MIN_CAPACITY {
        return Err(EventraError::InvalidInput(format!(
            "Event capacity must be at least {}",
            MIN_CAPACITY
        )));
    }

    let start_date = request.start_date.unwrap_or(event.start_date);
    let end_date = request.end_date.unwrap_or(event.end_date);
    if end_date <= start_date {
        return Err(EventraError::InvalidInput(
            "Event end date must be after the start date".to_string(),
        ));
    }

    let registration_start = request.registration_start.or(event.registration_start);
    let registration_end = request.registration_end.or(event.registration_end);
    if let Some(end) = registration_end {
        if end >= start_date {
            return Err(EventraError::InvalidInput(
                "Registration must close before the event starts".to_string(),
            ));
        }
        // only re-check recency when the edit itself moves the close date
        if request.registration_end.is_some() && end <= Utc::now() {
            return Err(EventraError::InvalidInput(
                "Registration end must be in the future".to_string(),
            ));
        }
    }

    if let (Some(start), Some(end)) = (registration_start, registration_end) {
        if end <= start {
            return Err(EventraError::InvalidInput(
                "Registration window must end after it starts".to_string(),
            ));
        }
    }

    Ok(())
}
