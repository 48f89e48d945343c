//! Organisation repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::database::query::{col, Column, ColumnKind, QuerySpec};
use crate::models::organisation::{
    CreateOrganisationRequest, Organisation, UpdateOrganisationRequest,
};
use crate::utils::errors::EventraError;

const EMAIL_UNIQUE_CONSTRAINT: &str = "organisations_email_key";

/// Columns untrusted organisation-listing parameters may touch
pub const ORGANISATION_FILTER_COLUMNS: &[Column] = &[
    col("name", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("org_type", ColumnKind::Text),
    col("created_at", ColumnKind::Timestamp),
];

#[derive(Debug, Clone)]
pub struct OrganisationRepository {
    pool: PgPool,
}

impl OrganisationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new organisation; a duplicate email surfaces as
    /// `DuplicateOrganisation`
    pub async fn create(
        &self,
        request: CreateOrganisationRequest,
    ) -> Result<Organisation, EventraError> {
        let result = sqlx::query_as::<_, Organisation>(
            r#"
            INSERT INTO organisations (name, org_type, description, email, phone, website, social_links, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.name)
        .bind(request.org_type.as_str())
        .bind(request.description)
        .bind(request.email)
        .bind(request.phone)
        .bind(request.website)
        .bind(request.social_links)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(organisation) => Ok(organisation),
            Err(e) if is_unique_violation(&e, EMAIL_UNIQUE_CONSTRAINT) => {
                Err(EventraError::DuplicateOrganisation)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find organisation by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Organisation>, EventraError> {
        let organisation =
            sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(organisation)
    }

    /// Update organisation profile fields
    pub async fn update(
        &self,
        id: i64,
        request: UpdateOrganisationRequest,
    ) -> Result<Organisation, EventraError> {
        let organisation = sqlx::query_as::<_, Organisation>(
            r#"
            UPDATE organisations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                phone = COALESCE($4, phone),
                website = COALESCE($5, website),
                logo_url = COALESCE($6, logo_url),
                cover_url = COALESCE($7, cover_url),
                social_links = COALESCE($8, social_links),
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.phone)
        .bind(request.website)
        .bind(request.logo_url)
        .bind(request.cover_url)
        .bind(request.social_links)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventraError::OrganisationNotFound { organisation_id: id })?;

        Ok(organisation)
    }

    /// Delete organisation
    pub async fn delete(&self, id: i64) -> Result<(), EventraError> {
        sqlx::query("DELETE FROM organisations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List organisations shaped by untrusted parameters
    pub async fn list(&self, spec: &QuerySpec) -> Result<Vec<Organisation>, EventraError> {
        let clauses = spec.clauses(1);
        let mut sql = "SELECT * FROM organisations".to_string();
        if !clauses.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.where_sql);
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            clauses.order_sql, clauses.limit, clauses.offset
        ));

        let mut query = sqlx::query_as::<_, Organisation>(&sql);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Total matching a shaped listing, ignoring pagination
    pub async fn count(&self, spec: &QuerySpec) -> Result<i64, EventraError> {
        let (sql, binds) = spec.count_sql("organisations");
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for value in &binds {
            query = query.bind(value);
        }

        Ok(query.fetch_one(&self.pool).await?.0)
    }

    /// Add a user to the organisation's admin set
    pub async fn add_admin(&self, organisation_id: i64, user_id: i64) -> Result<(), EventraError> {
        sqlx::query(
            r#"
            INSERT INTO organisation_admins (organisation_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (organisation_id, user_id) DO NOTHING
            "#,
        )
        .bind(organisation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a user from the organisation's admin set
    pub async fn remove_admin(
        &self,
        organisation_id: i64,
        user_id: i64,
    ) -> Result<(), EventraError> {
        sqlx::query("DELETE FROM organisation_admins WHERE organisation_id = $1 AND user_id = $2")
            .bind(organisation_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Admin user ids of an organisation
    pub async fn admin_ids(&self, organisation_id: i64) -> Result<Vec<i64>, EventraError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM organisation_admins WHERE organisation_id = $1")
                .bind(organisation_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Whether a user administers an organisation
    pub async fn is_admin(&self, organisation_id: i64, user_id: i64) -> Result<bool, EventraError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM organisation_admins WHERE organisation_id = $1 AND user_id = $2",
        )
        .bind(organisation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    /// Organisations a user administers
    pub async fn administered_by(&self, user_id: i64) -> Result<Vec<Organisation>, EventraError> {
        let organisations = sqlx::query_as::<_, Organisation>(
            r#"
            SELECT o.*
            FROM organisations o
            INNER JOIN organisation_admins oa ON oa.organisation_id = o.id
            WHERE oa.user_id = $1
            ORDER BY o.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(organisations)
    }
}

pub(crate) fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}
