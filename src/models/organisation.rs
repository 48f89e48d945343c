//! Organisation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::EventraError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organisation {
    pub id: i64,
    pub name: String,
    pub org_type: String,
    pub description: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub social_links: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganisationRequest {
    pub name: String,
    pub org_type: OrganisationType,
    pub description: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub social_links: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrganisationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub social_links: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganisationType {
    University,
    Company,
    Institution,
    Other,
}

impl OrganisationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganisationType::University => "university",
            OrganisationType::Company => "company",
            OrganisationType::Institution => "institution",
            OrganisationType::Other => "other",
        }
    }
}

impl std::str::FromStr for OrganisationType {
    type Err = EventraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "university" => Ok(OrganisationType::University),
            "company" => Ok(OrganisationType::Company),
            "institution" => Ok(OrganisationType::Institution),
            "other" => Ok(OrganisationType::Other),
            other => Err(EventraError::InvalidInput(format!(
                "Unknown organisation type: {}",
                other
            ))),
        }
    }
}
