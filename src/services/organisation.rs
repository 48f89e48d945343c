//! Organisation management service

use std::collections::HashMap;

use tracing::info;

use crate::config::Settings;
use crate::database::repositories::ORGANISATION_FILTER_COLUMNS;
use crate::database::{OrganisationRepository, QuerySpec, UserRepository};
use crate::models::organisation::{
    CreateOrganisationRequest, Organisation, UpdateOrganisationRequest,
};
use crate::utils::errors::{EventraError, Result};

#[derive(Clone)]
pub struct OrganisationService {
    organisations: OrganisationRepository,
    users: UserRepository,
    settings: Settings,
}

impl OrganisationService {
    pub fn new(
        organisations: OrganisationRepository,
        users: UserRepository,
        settings: Settings,
    ) -> Self {
        Self {
            organisations,
            users,
            settings,
        }
    }

    /// Register a new organisation; email must be unique across organisations
    pub async fn create_organisation(
        &self,
        request: CreateOrganisationRequest,
    ) -> Result<Organisation> {
        if request.name.trim().is_empty() {
            return Err(EventraError::InvalidInput(
                "Organisation name is required".to_string(),
            ));
        }
        if !request.email.contains('@') {
            return Err(EventraError::InvalidInput(
                "Organisation email is not valid".to_string(),
            ));
        }

        let organisation = self.organisations.create(request).await?;
        info!(organisation_id = organisation.id, "Organisation created");
        Ok(organisation)
    }

    pub async fn get_organisation(&self, organisation_id: i64) -> Result<Organisation> {
        self.organisations
            .find_by_id(organisation_id)
            .await?
            .ok_or(EventraError::OrganisationNotFound { organisation_id })
    }

    pub async fn update_organisation(
        &self,
        organisation_id: i64,
        request: UpdateOrganisationRequest,
    ) -> Result<Organisation> {
        self.organisations.update(organisation_id, request).await
    }

    /// List organisations shaped by untrusted parameters, with accurate total
    pub async fn list_organisations(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(Vec<Organisation>, i64)> {
        let spec = QuerySpec::new(ORGANISATION_FILTER_COLUMNS)
            .with_search_fields(&["name", "description"])
            .with_page_size(
                self.settings.limits.default_page_size,
                self.settings.limits.max_page_size,
            )
            .shape(params);

        let organisations = self.organisations.list(&spec).await?;
        let total = self.organisations.count(&spec).await?;
        Ok((organisations, total))
    }

    /// Add a user to an organisation's admin set
    pub async fn add_admin(&self, organisation_id: i64, user_id: i64) -> Result<()> {
        self.get_organisation(organisation_id).await?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(EventraError::UserNotFound { user_id })?;

        self.organisations.add_admin(organisation_id, user_id).await?;
        info!(
            organisation_id = organisation_id,
            user_id = user_id,
            "Organisation admin added"
        );
        Ok(())
    }

    /// Remove a user from an organisation's admin set
    pub async fn remove_admin(&self, organisation_id: i64, user_id: i64) -> Result<()> {
        self.get_organisation(organisation_id).await?;
        self.organisations
            .remove_admin(organisation_id, user_id)
            .await?;
        info!(
            organisation_id = organisation_id,
            user_id = user_id,
            "Organisation admin removed"
        );
        Ok(())
    }

    /// Admin user ids of an organisation
    pub async fn admin_ids(&self, organisation_id: i64) -> Result<Vec<i64>> {
        self.organisations.admin_ids(organisation_id).await
    }

    /// Organisations a user administers
    pub async fn administered_by(&self, user_id: i64) -> Result<Vec<Organisation>> {
        self.organisations.administered_by(user_id).await
    }
}
