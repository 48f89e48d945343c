//! Notification dispatch and read-side operations
//!
//! Dispatch always persists first: the stored row is the source of truth a
//! recipient sees on their next fetch, while the live emission through the
//! realtime channel is best-effort. Callers treat every dispatch method as
//! fire-and-forget: failures are logged and never surfaced as the primary
//! operation's error.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::database::repositories::notification::NOTIFICATION_FILTER_COLUMNS;
use crate::database::{NotificationRepository, QuerySpec, UserRepository};
use crate::models::application::{Application, Resolution};
use crate::models::event::Event;
use crate::models::notification::{CreateNotificationRequest, Notification, NotificationKind};
use crate::models::organisation::Organisation;
use crate::services::realtime::RealtimeChannel;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
    users: UserRepository,
    channel: Arc<dyn RealtimeChannel>,
    settings: Settings,
}

impl NotificationService {
    pub fn new(
        notifications: NotificationRepository,
        users: UserRepository,
        channel: Arc<dyn RealtimeChannel>,
        settings: Settings,
    ) -> Self {
        Self {
            notifications,
            users,
            channel,
            settings,
        }
    }

    /// Fan a freshly published event out to every active user: one persisted
    /// row per user, then a single broadcast with the light toast payload
    pub async fn notify_new_event(
        &self,
        event: &Event,
        organisation: &Organisation,
    ) -> Result<u64> {
        let recipient_ids = self.users.list_active_ids().await?;

        let title = format!("New event: {}", event.title);
        let message = format!(
            "{} has published \"{}\". Applications are open now.",
            organisation.name, event.title
        );

        let persisted = self
            .notifications
            .create_many(
                &recipient_ids,
                NotificationKind::NewEvent.as_str(),
                &title,
                &message,
                Some(event.id),
                None,
            )
            .await?;

        self.channel.emit_to_all(
            "new_event",
            json!({
                "event_id": event.id,
                "title": event.title,
                "cover_url": event.cover_url,
                "organisation": organisation.name,
            }),
        );

        info!(
            event_id = event.id,
            recipients = persisted,
            "New-event notifications dispatched"
        );
        Ok(persisted)
    }

    /// Tell every admin of the owning organisation that an application
    /// arrived; per-admin failures are logged and skipped
    pub async fn notify_new_application(
        &self,
        application: &Application,
        event: &Event,
        admin_ids: &[i64],
    ) -> Result<()> {
        for &admin_id in admin_ids {
            let request = CreateNotificationRequest {
                recipient_id: admin_id,
                kind: NotificationKind::ApplicationReceived,
                title: format!("New application for {}", event.title),
                message: "A user has applied to your event and is awaiting review.".to_string(),
                event_id: Some(event.id),
                application_id: Some(application.id),
            };

            match self.notifications.create(request).await {
                Ok(_) => {
                    self.channel.emit_to_user(
                        admin_id,
                        "application_received",
                        json!({
                            "application_id": application.id,
                            "event_id": event.id,
                            "event_title": event.title,
                        }),
                    );
                }
                Err(e) => {
                    warn!(
                        admin_id = admin_id,
                        application_id = application.id,
                        error = %e,
                        "Failed to persist application-received notification"
                    );
                }
            }
        }

        debug!(
            application_id = application.id,
            admins = admin_ids.len(),
            "Application-received notifications dispatched"
        );
        Ok(())
    }

    /// Tell the applicant their application was resolved
    pub async fn notify_application_status(
        &self,
        application: &Application,
        event: &Event,
        resolution: Resolution,
    ) -> Result<Notification> {
        let (kind, live_event, title, message) = match resolution {
            Resolution::Accepted => (
                NotificationKind::ApplicationAccepted,
                "application_accepted",
                format!("Accepted: {}", event.title),
                format!("Your application to \"{}\" was accepted.", event.title),
            ),
            Resolution::Rejected => (
                NotificationKind::ApplicationRejected,
                "application_rejected",
                format!("Update on {}", event.title),
                format!("Your application to \"{}\" was not accepted.", event.title),
            ),
        };

        let notification = self
            .notifications
            .create(CreateNotificationRequest {
                recipient_id: application.user_id,
                kind,
                title,
                message,
                event_id: Some(event.id),
                application_id: Some(application.id),
            })
            .await?;

        self.channel.emit_to_user(
            application.user_id,
            live_event,
            json!({
                "application_id": application.id,
                "event_id": event.id,
                "event_title": event.title,
                "rejection_reason": application.rejection_reason,
            }),
        );

        Ok(notification)
    }

    /// A recipient's notification list with accurate total
    pub async fn list_for(
        &self,
        recipient_id: i64,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Notification>, i64)> {
        let spec = QuerySpec::new(NOTIFICATION_FILTER_COLUMNS)
            .with_page_size(
                self.settings.limits.default_page_size,
                self.settings.limits.max_page_size,
            )
            .shape(params);

        let notifications = self
            .notifications
            .list_for_recipient(recipient_id, &spec)
            .await?;
        let total = self
            .notifications
            .count_for_recipient(recipient_id, &spec)
            .await?;

        Ok((notifications, total))
    }

    pub async fn unread_count(&self, recipient_id: i64) -> Result<i64> {
        self.notifications.unread_count(recipient_id).await
    }

    /// Mark one notification read; silently absorbs ids that do not belong
    /// to the recipient
    pub async fn mark_read(&self, id: i64, recipient_id: i64) -> Result<Option<Notification>> {
        self.notifications.mark_read(id, recipient_id).await
    }

    pub async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
        self.notifications.mark_all_read(recipient_id).await
    }
}
