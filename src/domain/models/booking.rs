use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Statuses that hold inventory.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecurringType {
    #[default]
    None,
    Weekly,
    Monthly,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    SlotUnavailable,
    BookingOverlap,
    RecurringOverlap,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub venue_id: String,
    pub renter_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub insurance_required: bool,
    pub insurance_approved: bool,
    pub recurring_type: RecurringType,
    pub recurring_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub venue_id: String,
    pub renter_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_amount: f64,
    pub insurance_required: bool,
    pub recurring_type: RecurringType,
    pub recurring_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            venue_id: params.venue_id,
            renter_id: params.renter_id,
            date: params.date,
            start_time: params.start_time,
            end_time: params.end_time,
            status: BookingStatus::Pending,
            total_amount: params.total_amount,
            insurance_required: params.insurance_required,
            insurance_approved: !params.insurance_required,
            recurring_type: params.recurring_type,
            recurring_end_date: params.recurring_end_date,
            notes: params.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Child occurrence of this booking on another date.
    pub fn occurrence(&self, date: NaiveDate) -> RecurringBooking {
        RecurringBooking {
            id: Uuid::new_v4().to_string(),
            parent_booking_id: self.id.clone(),
            venue_id: self.venue_id.clone(),
            renter_id: self.renter_id.clone(),
            date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: BookingStatus::Pending,
            total_amount: self.total_amount,
            insurance_required: self.insurance_required,
            insurance_approved: self.insurance_approved,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RecurringBooking {
    pub id: String,
    pub parent_booking_id: String,
    pub venue_id: String,
    pub renter_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub insurance_required: bool,
    pub insurance_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Booking plus the payment-flow hints the caller needs to pick a next step.
#[derive(Debug, Serialize, Clone)]
pub struct BookingWithFlow {
    #[serde(flatten)]
    pub booking: Booking,
    pub requires_immediate_payment: bool,
    pub awaiting_owner_approval: bool,
    pub awaiting_insurance_approval: bool,
    pub recurring_instances: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConflictCheck {
    pub has_conflict: bool,
    pub conflict_type: Option<ConflictType>,
    pub message: Option<String>,
}

impl ConflictCheck {
    pub fn clear() -> Self {
        Self { has_conflict: false, conflict_type: None, message: None }
    }

    pub fn conflict(conflict_type: ConflictType, message: impl Into<String>) -> Self {
        Self {
            has_conflict: true,
            conflict_type: Some(conflict_type),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeView {
    Upcoming,
    Past,
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub venue_id: Option<String>,
    pub renter_id: Option<String>,
    pub venue_ids: Option<Vec<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
