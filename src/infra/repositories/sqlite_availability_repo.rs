use crate::domain::{models::availability::Availability, ports::AvailabilityRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn create(&self, availability: &Availability) -> Result<Availability, AppError> {
        sqlx::query_as::<_, Availability>(
            "INSERT INTO availability (id, venue_id, date, start_time, end_time, is_available) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&availability.id).bind(&availability.venue_id).bind(availability.date)
            .bind(availability.start_time).bind(availability.end_time).bind(availability.is_available)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Availability>, AppError> {
        sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE venue_id = ? AND date >= ? AND date <= ? ORDER BY date ASC, start_time ASC").bind(venue_id).bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
