//! Application model: a user's request to attend an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::EventraError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: String,
    pub message: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: i64,
    pub event_id: i64,
    pub status: ApplicationStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = EventraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "cancelled" => Ok(ApplicationStatus::Cancelled),
            other => Err(EventraError::InvalidInput(format!(
                "Unknown application status: {}",
                other
            ))),
        }
    }
}

/// The resolutions an authorized resolver may apply to a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Accepted,
    Rejected,
}

impl Resolution {
    pub fn as_status(&self) -> ApplicationStatus {
        match self {
            Resolution::Accepted => ApplicationStatus::Accepted,
            Resolution::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Outcome of cancelling an application: paid events archive the row for
/// the audit trail, free events delete it outright.
#[derive(Debug, Clone)]
pub enum CancellationOutcome {
    Archived(Application),
    Deleted,
}

impl Application {
    pub fn status(&self) -> Result<ApplicationStatus, EventraError> {
        self.status.parse()
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending.as_str()
    }

    pub fn is_cancellable(&self) -> bool {
        self.status == ApplicationStatus::Pending.as_str()
            || self.status == ApplicationStatus::Accepted.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_resolution_maps_to_status() {
        assert_eq!(Resolution::Accepted.as_status(), ApplicationStatus::Accepted);
        assert_eq!(Resolution::Rejected.as_status(), ApplicationStatus::Rejected);
    }
}
