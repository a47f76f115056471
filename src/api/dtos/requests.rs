use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};

use crate::domain::models::{
    auth::Role,
    booking::{BookingStatus, RecurringType, TimeView},
};
use crate::domain::services::booking_service::{CreateBookingInput, ListBookingsQuery};
use crate::domain::services::time_range::parse_time;

/// Accepts both `HH:MM` and `HH:MM:SS`.
fn time_of_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
pub struct SlotRangeQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Deserialize)]
pub struct ConflictQuery {
    pub date: NaiveDate,
    #[serde(deserialize_with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "time_of_day")]
    pub end_time: NaiveTime,
    pub exclude_booking_id: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateSlotInstancesRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub venue_id: String,
    pub date: NaiveDate,
    #[serde(deserialize_with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "time_of_day")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub recurring_type: RecurringType,
    pub recurring_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl From<CreateBookingRequest> for CreateBookingInput {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            venue_id: req.venue_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            recurring_type: req.recurring_type,
            recurring_end_date: req.recurring_end_date,
            notes: req.notes,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ListBookingsParams {
    pub status: Option<BookingStatus>,
    pub venue_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub role_view: Option<Role>,
    pub time_view: Option<TimeView>,
}

impl From<ListBookingsParams> for ListBookingsQuery {
    fn from(p: ListBookingsParams) -> Self {
        Self {
            status: p.status,
            venue_id: p.venue_id,
            date_from: p.date_from,
            date_to: p.date_to,
            role_view: p.role_view,
            time_view: p.time_view,
        }
    }
}
