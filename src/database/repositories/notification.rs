//! Notification repository implementation

use sqlx::PgPool;

use crate::database::query::{col, Column, ColumnKind, QuerySpec};
use crate::models::notification::{CreateNotificationRequest, Notification};
use crate::utils::errors::EventraError;

/// Columns untrusted notification-listing parameters may touch
pub const NOTIFICATION_FILTER_COLUMNS: &[Column] = &[
    col("kind", ColumnKind::Text),
    col("is_read", ColumnKind::Bool),
    col("event_id", ColumnKind::Int),
    col("created_at", ColumnKind::Timestamp),
];

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a single notification row
    pub async fn create(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<Notification, EventraError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, kind, title, message, event_id, application_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.recipient_id)
        .bind(request.kind.as_str())
        .bind(request.title)
        .bind(request.message)
        .bind(request.event_id)
        .bind(request.application_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Persist one row per recipient in a single statement; used by the
    /// new-event fan-out where the audience is every active user
    pub async fn create_many(
        &self,
        recipient_ids: &[i64],
        kind: &str,
        title: &str,
        message: &str,
        event_id: Option<i64>,
        application_id: Option<i64>,
    ) -> Result<u64, EventraError> {
        if recipient_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, kind, title, message, event_id, application_id)
            SELECT recipient_id, $2, $3, $4, $5, $6
            FROM UNNEST($1::bigint[]) AS recipient_id
            "#,
        )
        .bind(recipient_ids)
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(event_id)
        .bind(application_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// A recipient's notifications, shaped by untrusted parameters
    pub async fn list_for_recipient(
        &self,
        recipient_id: i64,
        spec: &QuerySpec,
    ) -> Result<Vec<Notification>, EventraError> {
        let clauses = spec.clauses(2);
        let mut sql = "SELECT * FROM notifications WHERE recipient_id = $1".to_string();
        if !clauses.where_sql.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&clauses.where_sql);
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            clauses.order_sql, clauses.limit, clauses.offset
        ));

        let mut query = sqlx::query_as::<_, Notification>(&sql).bind(recipient_id);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Total matching a shaped recipient listing, ignoring pagination
    pub async fn count_for_recipient(
        &self,
        recipient_id: i64,
        spec: &QuerySpec,
    ) -> Result<i64, EventraError> {
        let clauses = spec.clauses(2);
        let mut sql = "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1".to_string();
        if !clauses.where_sql.is_empty() {
            sql.push_str(" AND ");
            sql.push_str(&clauses.where_sql);
        }

        let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(recipient_id);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_one(&self.pool).await?.0)
    }

    /// Unread notifications for a recipient
    pub async fn unread_count(&self, recipient_id: i64) -> Result<i64, EventraError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Mark one notification read; scoped to the recipient so users cannot
    /// flip each other's flags
    pub async fn mark_read(
        &self,
        id: i64,
        recipient_id: i64,
    ) -> Result<Option<Notification>, EventraError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND recipient_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Mark everything read for a recipient
    pub async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, EventraError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
