use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use sqlx::FromRow;
use tracing::warn;

use crate::domain::models::slot_instance::SlotActionType;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Venue {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub hourly_rate: f64,
    pub instant_booking: bool,
    pub insurance_required: bool,
    pub max_advance_booking_days: i32,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl Venue {
    /// Venue timezone. An unparseable name falls back to UTC.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!(venue_id = %self.id, timezone = %self.timezone, "Invalid venue timezone, using UTC");
            chrono_tz::UTC
        })
    }

    /// Action type that regular (gap-computed) slots carry for this venue.
    pub fn booking_action_type(&self) -> SlotActionType {
        if self.instant_booking {
            SlotActionType::InstantBook
        } else {
            SlotActionType::RequestPrivate
        }
    }

    pub fn requires_immediate_payment(&self) -> bool {
        self.instant_booking && !self.insurance_required
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OperatingHoursWindow {
    pub weekday: Weekday,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// Venue-level booking policy. Absent config means every check passes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VenueAdminConfig {
    pub venue_id: String,
    pub min_advance_lead_time_hours: i32,
    pub same_day_cutoff_time: Option<NaiveTime>,
    pub blackout_dates: Vec<NaiveDate>,
    pub holiday_dates: Vec<NaiveDate>,
    // Loaded for the admin UI; not consulted by the policy gate.
    pub operating_hours: Vec<OperatingHoursWindow>,
    pub drop_in_enabled: bool,
    pub drop_in_price: Option<f64>,
}

impl VenueAdminConfig {
    pub fn permissive(venue_id: impl Into<String>) -> Self {
        Self {
            venue_id: venue_id.into(),
            min_advance_lead_time_hours: 0,
            same_day_cutoff_time: None,
            blackout_dates: Vec::new(),
            holiday_dates: Vec::new(),
            operating_hours: Vec::new(),
            drop_in_enabled: false,
            drop_in_price: None,
        }
    }
}
