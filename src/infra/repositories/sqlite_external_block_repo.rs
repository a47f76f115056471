use crate::domain::{models::availability::ExternalAvailabilityBlock, ports::ExternalBlockRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteExternalBlockRepo {
    pool: SqlitePool,
}

impl SqliteExternalBlockRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExternalBlockRepository for SqliteExternalBlockRepo {
    async fn create(&self, block: &ExternalAvailabilityBlock) -> Result<ExternalAvailabilityBlock, AppError> {
        sqlx::query_as::<_, ExternalAvailabilityBlock>(
            "INSERT INTO external_availability_blocks (id, venue_id, source, source_event_id, start_at, end_at, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(venue_id, source, source_event_id) DO UPDATE SET start_at = excluded.start_at, end_at = excluded.end_at, status = excluded.status
             RETURNING *"
        )
            .bind(&block.id).bind(&block.venue_id).bind(&block.source).bind(&block.source_event_id)
            .bind(block.start_at).bind(block.end_at).bind(&block.status)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_overlapping(&self, venue_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ExternalAvailabilityBlock>, AppError> {
        sqlx::query_as::<_, ExternalAvailabilityBlock>("SELECT * FROM external_availability_blocks WHERE venue_id = ? AND start_at < ? AND end_at > ? AND status != 'cancelled'").bind(venue_id).bind(end).bind(start).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
