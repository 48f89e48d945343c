//! Event model and status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::EventraError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub organisation_id: i64,
    pub category: String,
    pub format: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub registered_count: i32,
    pub is_free: bool,
    pub price_cents: i64,
    pub currency: String,
    pub status: String,
    pub requirements: Option<String>,
    pub contact: Option<String>,
    pub cover_url: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub organisation_id: i64,
    pub category: EventCategory,
    pub format: EventFormat,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub is_free: bool,
    pub price_cents: i64,
    pub currency: Option<String>,
    pub requirements: Option<String>,
    pub contact: Option<String>,
    pub cover_url: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub requirements: Option<String>,
    pub contact: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Legal forward transitions; cancellation is allowed from any
    /// pre-completed state.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Draft, EventStatus::Published)
                | (EventStatus::Published, EventStatus::Ongoing)
                | (EventStatus::Ongoing, EventStatus::Completed)
                | (EventStatus::Draft, EventStatus::Cancelled)
                | (EventStatus::Published, EventStatus::Cancelled)
                | (EventStatus::Ongoing, EventStatus::Cancelled)
        )
    }
}

impl std::str::FromStr for EventStatus {
    type Err = EventraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(EventraError::InvalidInput(format!(
                "Unknown event status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Conference,
    Workshop,
    Hackathon,
    Seminar,
    Social,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Conference => "conference",
            EventCategory::Workshop => "workshop",
            EventCategory::Hackathon => "hackathon",
            EventCategory::Seminar => "seminar",
            EventCategory::Social => "social",
            EventCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    Online,
    Offline,
    Hybrid,
}

impl EventFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFormat::Online => "online",
            EventFormat::Offline => "offline",
            EventFormat::Hybrid => "hybrid",
        }
    }
}

impl Event {
    pub fn status(&self) -> Result<EventStatus, EventraError> {
        self.status.parse()
    }

    /// Paid events auto-accept applications and keep cancelled rows for audit.
    /// Free means price at or below zero, or the explicit free flag.
    pub fn is_paid(&self) -> bool {
        !self.is_free && self.price_cents > 0
    }

    pub fn registration_closed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.registration_end, Some(end) if end <= now)
    }
}
