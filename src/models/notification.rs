//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::EventraError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub event_id: Option<i64>,
    pub application_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub event_id: Option<i64>,
    pub application_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewEvent,
    ApplicationReceived,
    ApplicationAccepted,
    ApplicationRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewEvent => "new_event",
            NotificationKind::ApplicationReceived => "application_received",
            NotificationKind::ApplicationAccepted => "application_accepted",
            NotificationKind::ApplicationRejected => "application_rejected",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = EventraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_event" => Ok(NotificationKind::NewEvent),
            "application_received" => Ok(NotificationKind::ApplicationReceived),
            "application_accepted" => Ok(NotificationKind::ApplicationAccepted),
            "application_rejected" => Ok(NotificationKind::ApplicationRejected),
            other => Err(EventraError::InvalidInput(format!(
                "Unknown notification kind: {}",
                other
            ))),
        }
    }
}
