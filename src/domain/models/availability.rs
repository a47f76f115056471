use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;
use uuid::Uuid;

/// An explicit open window for a venue on one date.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Availability {
    pub id: String,
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl Availability {
    pub fn new(venue_id: String, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            venue_id,
            date,
            start_time,
            end_time,
            is_available: true,
        }
    }
}

/// Busy interval sourced from a third-party calendar, in absolute time.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ExternalAvailabilityBlock {
    pub id: String,
    pub venue_id: String,
    pub source: String,
    pub source_event_id: String,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub end_at: chrono::DateTime<chrono::Utc>,
    pub status: String,
}
