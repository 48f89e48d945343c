//! Application repository implementation
//!
//! The conditional updates here are the storage-level half of the workflow
//! contract: acceptance is a single atomic status-and-capacity check, and
//! the partial unique index on (user_id, event_id) over non-cancelled rows
//! backstops the duplicate pre-check under concurrency.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::query::{col, Column, ColumnKind, QuerySpec};
use crate::database::repositories::organisation::is_unique_violation;
use crate::models::application::{Application, CreateApplicationRequest};
use crate::utils::errors::EventraError;

const ACTIVE_UNIQUE_INDEX: &str = "applications_user_event_active_idx";

#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new application; a concurrent duplicate for the same
    /// (user, event) pair trips the partial unique index and is reported
    /// as `DuplicateApplication`
    pub async fn create(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<Application, EventraError> {
        let result = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (user_id, event_id, status, message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.event_id)
        .bind(request.status.as_str())
        .bind(request.message)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(application) => Ok(application),
            Err(e) if is_unique_violation(&e, ACTIVE_UNIQUE_INDEX) => {
                Err(EventraError::DuplicateApplication)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find application by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Application>, EventraError> {
        let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    /// The non-cancelled application for a (user, event) pair, if any
    pub async fn find_active(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<Application>, EventraError> {
        let application = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE user_id = $1 AND event_id = $2 AND status <> 'cancelled'",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    /// Applications a user has created since a point in time, all statuses.
    /// Drives the daily rate limit; cancelled rows still count.
    pub async fn count_for_user_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, EventraError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Accepted applications for an event, the number capacity is measured against
    pub async fn count_accepted(&self, event_id: i64) -> Result<i64, EventraError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE event_id = $1 AND status = 'accepted'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Accept a pending application only while accepted count stays below
    /// capacity, in one conditional statement. Returns None when the row
    /// was no longer pending or the event is full; the caller re-reads to
    /// tell the two apart.
    pub async fn accept_within_capacity(
        &self,
        id: i64,
        resolver_id: i64,
        capacity: i64,
    ) -> Result<Option<Application>, EventraError> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications a
            SET status = 'accepted', processed_by = $2, updated_at = $3
            WHERE a.id = $1
              AND a.status = 'pending'
              AND (
                  SELECT COUNT(*) FROM applications
                  WHERE event_id = a.event_id AND status = 'accepted'
              ) < $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolver_id)
        .bind(Utc::now())
        .bind(capacity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    /// Reject a pending application; None when it was already resolved
    pub async fn reject_pending(
        &self,
        id: i64,
        resolver_id: i64,
        rejection_reason: Option<String>,
    ) -> Result<Option<Application>, EventraError> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = 'rejected', processed_by = $2, rejection_reason = $3, updated_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolver_id)
        .bind(rejection_reason)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    /// Archive a cancellation: the row stays with status=cancelled
    pub async fn mark_cancelled(&self, id: i64) -> Result<Application, EventraError> {
        let application = sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = 'cancelled', updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventraError::ApplicationNotFound { application_id: id })?;

        Ok(application)
    }

    /// Delete an application row outright
    pub async fn delete(&self, id: i64) -> Result<(), EventraError> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// A user's own applications, shaped by untrusted parameters
    pub async fn list_for_user(
        &self,
        user_id: i64,
        spec: &QuerySpec,
    ) -> Result<Vec<Application>, EventraError> {
        self.list_scoped("a.user_id = $1", user_id, spec).await
    }

    pub async fn count_for_user(&self, user_id: i64, spec: &QuerySpec) -> Result<i64, EventraError> {
        self.count_scoped("a.user_id = $1", user_id, spec).await
    }

    /// Applications for events owned by organisations the resolver administers
    pub async fn list_for_resolver(
        &self,
        resolver_id: i64,
        spec: &QuerySpec,
    ) -> Result<Vec<Application>, EventraError> {
        self.list_scoped(RESOLVER_SCOPE, resolver_id, spec).await
    }

    pub async fn count_for_resolver(
        &self,
        resolver_id: i64,
        spec: &QuerySpec,
    ) -> Result<i64, EventraError> {
        self.count_scoped(RESOLVER_SCOPE, resolver_id, spec).await
    }

    /// Every application, for platform admins
    pub async fn list_all(&self, spec: &QuerySpec) -> Result<Vec<Application>, EventraError> {
        let clauses = spec.clauses(1);
        let mut sql = "SELECT * FROM applications".to_string();
        if !clauses.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.where_sql);
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            clauses.order_sql, clauses.limit, clauses.offset
        ));

        let mut query = sqlx::query_as::<_, Application>(&sql);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn count_all(&self, spec: &QuerySpec) -> Result<i64, EventraError> {
        let (sql, binds) = spec.count_sql("applications");
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for value in &binds {
            query = query.bind(value);
        }

        Ok(query.fetch_one(&self.pool).await?.0)
    }

    async fn list_scoped(
        &self,
        scope_sql: &str,
        scope_id: i64,
        spec: &QuerySpec,
    ) -> Result<Vec<Application>, EventraError> {
        let clauses = spec.clauses(2);
        let mut sql = format!("SELECT a.* FROM applications a WHERE {}", scope_sql);
        if !clauses.where_sql.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&qualify(&clauses.where_sql));
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            qualify(&clauses.order_sql),
            clauses.limit,
            clauses.offset
        ));

        let mut query = sqlx::query_as::<_, Application>(&sql).bind(scope_id);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn count_scoped(
        &self,
        scope_sql: &str,
        scope_id: i64,
        spec: &QuerySpec,
    ) -> Result<i64, EventraError> {
        let clauses = spec.clauses(2);
        let mut sql = format!("SELECT COUNT(*) FROM applications a WHERE {}", scope_sql);
        if !clauses.where_sql.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&qualify(&clauses.where_sql));
        }

        let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(scope_id);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_one(&self.pool).await?.0)
    }
}

const RESOLVER_SCOPE: &str = "a.event_id IN (
    SELECT e.id FROM events e
    INNER JOIN organisation_admins oa ON oa.organisation_id = e.organisation_id
    WHERE oa.user_id = $1
)";

/// Prefix shaped column references with the applications alias
fn qualify(fragment: &str) -> String {
    APPLICATION_FILTER_COLUMN_NAMES
        .iter()
        .fold(fragment.to_string(), |acc, name| {
            acc.replace(name, &format!("a.{}", name))
        })
}

// Column whitelist untrusted application-listing parameters may touch.
// Names must not be substrings of one another or `qualify` would mangle them.
pub const APPLICATION_FILTER_COLUMNS: &[Column] = &[
    col("status", ColumnKind::Text),
    col("event_id", ColumnKind::Int),
    col("created_at", ColumnKind::Timestamp),
];

const APPLICATION_FILTER_COLUMN_NAMES: &[&str] = &["status", "event_id", "created_at"];
