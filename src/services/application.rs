//! Application workflow engine
//!
//! Enforces who may apply to an event, how often, under what capacity and
//! timing constraints, and who may resolve a pending application. Every
//! entry point runs its precondition checks in a fixed order and
//! short-circuits on the first failure, so no partial side effects occur
//! before the first failing check. Notification dispatch is a best-effort
//! side channel: failures are logged and never fail the operation or roll
//! back the committed state change.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::database::repositories::APPLICATION_FILTER_COLUMNS;
use crate::database::{
    ApplicationRepository, EventRepository, OrganisationRepository, QuerySpec,
};
use crate::models::application::{
    Application, ApplicationStatus, CancellationOutcome, CreateApplicationRequest, Resolution,
};
use crate::models::event::{Event, EventStatus};
use crate::models::user::{Principal, Role};
use crate::services::notification::NotificationService;
use crate::utils::errors::{EventraError, Result};

#[derive(Clone)]
pub struct ApplicationService {
    applications: ApplicationRepository,
    events: EventRepository,
    organisations: OrganisationRepository,
    notifications: NotificationService,
    settings: Settings,
}

impl ApplicationService {
    pub fn new(
        applications: ApplicationRepository,
        events: EventRepository,
        organisations: OrganisationRepository,
        notifications: NotificationService,
        settings: Settings,
    ) -> Self {
        Self {
            applications,
            events,
            organisations,
            notifications,
            settings,
        }
    }

    /// Apply to an event on behalf of a user.
    ///
    /// Check order is part of the contract: existence, published status,
    /// registration window, daily quota, capacity, duplicate. Paid events
    /// skip manual review and are accepted on creation; free events start
    /// pending and notify the owning organisation's admins.
    pub async fn create_application(
        &self,
        user_id: i64,
        event_id: i64,
        message: Option<String>,
    ) -> Result<Application> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(EventraError::EventNotFound { event_id })?;

        if event.status != EventStatus::Published.as_str() {
            return Err(EventraError::InvalidState(format!(
                "Cannot apply to an event in status '{}'",
                event.status
            )));
        }

        let now = Utc::now();
        if event.registration_closed(now) {
            return Err(EventraError::RegistrationClosed);
        }

        // Daily quota counts every application created since local
        // midnight, cancelled ones included; cancelling does not free a
        // slot for the same day.
        let limit = self.settings.limits.daily_application_limit;
        let today_count = self
            .applications
            .count_for_user_since(user_id, start_of_local_day())
            .await?;
        if today_count >= i64::from(limit) {
            warn!(
                user_id = user_id,
                today_count = today_count,
                "Daily application limit reached"
            );
            return Err(EventraError::RateLimited { limit });
        }

        // Capacity is measured against accepted applications only, so
        // free-event pending applications may queue past capacity and are
        // gated again at acceptance time.
        let accepted = self.applications.count_accepted(event_id).await?;
        if accepted >= i64::from(event.capacity) {
            return Err(EventraError::CapacityExceeded);
        }

        // Pre-check; the partial unique index backstops the concurrent case
        if self
            .applications
            .find_active(user_id, event_id)
            .await?
            .is_some()
        {
            return Err(EventraError::DuplicateApplication);
        }

        let status = if event.is_paid() {
            ApplicationStatus::Accepted
        } else {
            ApplicationStatus::Pending
        };

        let application = self
            .applications
            .create(CreateApplicationRequest {
                user_id,
                event_id,
                status,
                message,
            })
            .await?;

        info!(
            application_id = application.id,
            user_id = user_id,
            event_id = event_id,
            status = status.as_str(),
            "Application created"
        );

        match status {
            ApplicationStatus::Accepted => {
                if let Err(e) = self.events.refresh_registered_count(event_id).await {
                    warn!(event_id = event_id, error = %e, "Failed to refresh registered count");
                }
            }
            ApplicationStatus::Pending => {
                self.dispatch_received(&application, &event).await;
            }
            _ => {}
        }

        Ok(application)
    }

    /// Resolve a pending application to accepted or rejected.
    ///
    /// Platform admins may resolve anything. Organisation-role resolvers
    /// must administer the owning organisation and may only touch free
    /// events; paid-event applications never reach pending. Acceptance
    /// re-checks capacity atomically at resolution time.
    pub async fn update_application_status(
        &self,
        application_id: i64,
        principal: Principal,
        resolution: Resolution,
        rejection_reason: Option<String>,
    ) -> Result<Application> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(EventraError::ApplicationNotFound { application_id })?;

        if !application.is_pending() {
            return Err(EventraError::AlreadyProcessed);
        }

        let event = self
            .events
            .find_by_id(application.event_id)
            .await?
            .ok_or(EventraError::EventNotFound {
                event_id: application.event_id,
            })?;

        self.authorize_resolver(principal, &event).await?;

        let resolved = match resolution {
            Resolution::Accepted => {
                let accepted = self
                    .applications
                    .accept_within_capacity(application_id, principal.id, i64::from(event.capacity))
                    .await?;

                match accepted {
                    Some(application) => {
                        if let Err(e) = self.events.refresh_registered_count(event.id).await {
                            warn!(event_id = event.id, error = %e, "Failed to refresh registered count");
                        }
                        application
                    }
                    // The conditional update missed: either a concurrent
                    // resolver got there first or the event filled up.
                    None => {
                        let current = self
                            .applications
                            .find_by_id(application_id)
                            .await?
                            .ok_or(EventraError::ApplicationNotFound { application_id })?;
                        if current.is_pending() {
                            return Err(EventraError::CapacityExceeded);
                        }
                        return Err(EventraError::AlreadyProcessed);
                    }
                }
            }
            Resolution::Rejected => self
                .applications
                .reject_pending(application_id, principal.id, rejection_reason)
                .await?
                .ok_or(EventraError::AlreadyProcessed)?,
        };

        info!(
            application_id = application_id,
            resolver_id = principal.id,
            resolution = resolution.as_status().as_str(),
            "Application resolved"
        );

        if let Err(e) = self
            .notifications
            .notify_application_status(&resolved, &event, resolution)
            .await
        {
            warn!(
                application_id = application_id,
                error = %e,
                "Failed to dispatch status notification"
            );
        }

        Ok(resolved)
    }

    /// Cancel an application as its owner.
    ///
    /// Paid events archive the row with status=cancelled to keep the
    /// financial audit trail; free events delete it outright, which frees
    /// the (user, event) pair for re-application.
    pub async fn cancel_application(
        &self,
        application_id: i64,
        user_id: i64,
    ) -> Result<CancellationOutcome> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(EventraError::ApplicationNotFound { application_id })?;

        if application.user_id != user_id {
            return Err(EventraError::Forbidden(
                "Only the applicant may cancel an application".to_string(),
            ));
        }

        if !application.is_cancellable() {
            return Err(EventraError::InvalidState(format!(
                "Cannot cancel an application in status '{}'",
                application.status
            )));
        }

        let event = self
            .events
            .find_by_id(application.event_id)
            .await?
            .ok_or(EventraError::EventNotFound {
                event_id: application.event_id,
            })?;

        let was_accepted = application.status == ApplicationStatus::Accepted.as_str();

        let outcome = if event.is_paid() {
            let archived = self.applications.mark_cancelled(application_id).await?;
            CancellationOutcome::Archived(archived)
        } else {
            self.applications.delete(application_id).await?;
            CancellationOutcome::Deleted
        };

        if was_accepted {
            if let Err(e) = self.events.refresh_registered_count(event.id).await {
                warn!(event_id = event.id, error = %e, "Failed to refresh registered count");
            }
        }

        info!(
            application_id = application_id,
            user_id = user_id,
            archived = matches!(outcome, CancellationOutcome::Archived(_)),
            "Application cancelled"
        );

        Ok(outcome)
    }

    /// A user's own applications
    pub async fn my_applications(
        &self,
        user_id: i64,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Application>, i64)> {
        let spec = self.listing_spec(params);
        let applications = self.applications.list_for_user(user_id, &spec).await?;
        let total = self.applications.count_for_user(user_id, &spec).await?;
        Ok((applications, total))
    }

    /// Applications for events owned by organisations the principal
    /// administers; a principal administering nothing sees an empty page
    pub async fn organisation_applications(
        &self,
        principal: Principal,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Application>, i64)> {
        let spec = self.listing_spec(params);
        let applications = self
            .applications
            .list_for_resolver(principal.id, &spec)
            .await?;
        let total = self
            .applications
            .count_for_resolver(principal.id, &spec)
            .await?;
        Ok((applications, total))
    }

    /// Every application, for platform admins
    pub async fn admin_applications(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Application>, i64)> {
        let spec = self.listing_spec(params);
        let applications = self.applications.list_all(&spec).await?;
        let total = self.applications.count_all(&spec).await?;
        Ok((applications, total))
    }

    async fn authorize_resolver(&self, principal: Principal, event: &Event) -> Result<()> {
        match principal.role {
            Role::Admin => Ok(()),
            Role::Organisation => {
                if event.is_paid() {
                    return Err(EventraError::Forbidden(
                        "Paid-event applications are resolved automatically".to_string(),
                    ));
                }
                if !self
                    .organisations
                    .is_admin(event.organisation_id, principal.id)
                    .await?
                {
                    return Err(EventraError::Forbidden(
                        "Not an admin of the owning organisation".to_string(),
                    ));
                }
                Ok(())
            }
            Role::User => Err(EventraError::Forbidden(
                "Users cannot resolve applications".to_string(),
            )),
        }
    }

    /// Best-effort fan-out to the owning organisation's admins
    async fn dispatch_received(&self, application: &Application, event: &Event) {
        let admin_ids = match self.organisations.admin_ids(event.organisation_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    organisation_id = event.organisation_id,
                    error = %e,
                    "Failed to load organisation admins for notification"
                );
                return;
            }
        };

        if admin_ids.is_empty() {
            debug!(
                organisation_id = event.organisation_id,
                "Organisation has no admins to notify"
            );
            return;
        }

        if let Err(e) = self
            .notifications
            .notify_new_application(application, event, &admin_ids)
            .await
        {
            warn!(
                application_id = application.id,
                error = %e,
                "Failed to dispatch application-received notifications"
            );
        }
    }

    fn listing_spec(&self, params: &HashMap<String, String>) -> QuerySpec {
        QuerySpec::new(APPLICATION_FILTER_COLUMNS)
            .with_page_size(
                self.settings.limits.default_page_size,
                self.settings.limits.max_page_size,
            )
            .shape(params)
    }
}

/// Start of the current calendar day in the server's local timezone,
/// the boundary the daily application quota resets at
fn start_of_local_day() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_local_day_is_midnight() {
        let start = start_of_local_day();
        let local = start.with_timezone(&Local);
        assert_eq!(local.time(), NaiveTime::MIN);
        assert!(start <= Utc::now());
    }
}
