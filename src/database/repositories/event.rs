//! Event repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::database::query::{col, Column, ColumnKind, QuerySpec};
use crate::models::event::{CreateEventRequest, Event, EventStatus, UpdateEventRequest};
use crate::utils::errors::EventraError;

/// Columns untrusted event-listing parameters may touch
pub const EVENT_FILTER_COLUMNS: &[Column] = &[
    col("title", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("category", ColumnKind::Text),
    col("format", ColumnKind::Text),
    col("status", ColumnKind::Text),
    col("organisation_id", ColumnKind::Int),
    col("is_free", ColumnKind::Bool),
    col("start_date", ColumnKind::Timestamp),
    col("created_at", ColumnKind::Timestamp),
];

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event in draft status
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, EventraError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                title, description, organisation_id, category, format,
                start_date, end_date, registration_start, registration_end,
                capacity, is_free, price_cents, currency, requirements,
                contact, cover_url, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(request.title)
        .bind(request.description)
        .bind(request.organisation_id)
        .bind(request.category.as_str())
        .bind(request.format.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.registration_start)
        .bind(request.registration_end)
        .bind(request.capacity)
        .bind(request.is_free)
        .bind(request.price_cents)
        .bind(request.currency.unwrap_or_else(|| "USD".to_string()))
        .bind(request.requirements)
        .bind(request.contact)
        .bind(request.cover_url)
        .bind(request.created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, EventraError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Update draft-editable fields
    pub async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event, EventraError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                registration_start = COALESCE($6, registration_start),
                registration_end = COALESCE($7, registration_end),
                capacity = COALESCE($8, capacity),
                requirements = COALESCE($9, requirements),
                contact = COALESCE($10, contact),
                cover_url = COALESCE($11, cover_url),
                updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.registration_start)
        .bind(request.registration_end)
        .bind(request.capacity)
        .bind(request.requirements)
        .bind(request.contact)
        .bind(request.cover_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventraError::EventNotFound { event_id: id })?;

        Ok(event)
    }

    /// Conditionally move an event between statuses; returns None when the
    /// row is no longer in `from`, so transitions never clobber each other
    pub async fn transition_status(
        &self,
        id: i64,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, EventraError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Recompute the cached registered_count from accepted applications
    pub async fn refresh_registered_count(&self, id: i64) -> Result<(), EventraError> {
        sqlx::query(
            r#"
            UPDATE events
            SET registered_count = (
                SELECT COUNT(*) FROM applications
                WHERE event_id = $1 AND status = 'accepted'
            )
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete event
    pub async fn delete(&self, id: i64) -> Result<(), EventraError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List events shaped by untrusted parameters
    pub async fn list(&self, spec: &QuerySpec) -> Result<Vec<Event>, EventraError> {
        let clauses = spec.clauses(1);
        let mut sql = "SELECT * FROM events".to_string();
        if !clauses.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.where_sql);
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            clauses.order_sql, clauses.limit, clauses.offset
        ));

        let mut query = sqlx::query_as::<_, Event>(&sql);
        for value in &clauses.binds {
            query = query.bind(value);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Total matching a shaped listing, ignoring pagination
    pub async fn count(&self, spec: &QuerySpec) -> Result<i64, EventraError> {
        let (sql, binds) = spec.count_sql("events");
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for value in &binds {
            query = query.bind(value);
        }

        Ok(query.fetch_one(&self.pool).await?.0)
    }

    /// Events owned by an organisation
    pub async fn for_organisation(&self, organisation_id: i64) -> Result<Vec<Event>, EventraError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE organisation_id = $1 ORDER BY start_date ASC",
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
