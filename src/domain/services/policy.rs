use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::domain::models::venue::VenueAdminConfig;
use crate::domain::services::time_range::local_to_utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    LeadTime { hours: i32 },
    SameDayCutoff { cutoff: NaiveTime },
    Blackout { date: NaiveDate },
    Holiday { date: NaiveDate },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::LeadTime { hours } => {
                write!(f, "Bookings require at least {} hours lead time", hours)
            }
            PolicyViolation::SameDayCutoff { cutoff } => {
                write!(f, "Same-day bookings are closed after the {} cutoff", cutoff.format("%H:%M"))
            }
            PolicyViolation::Blackout { date } => write!(f, "{} is a blackout date for this venue", date),
            PolicyViolation::Holiday { date } => write!(f, "{} is a holiday closure for this venue", date),
        }
    }
}

/// Checks a candidate slot against the venue's lead time, same-day cutoff,
/// blackout and holiday rules. Operating-hours windows are not consulted.
pub fn check_slot(
    config: &VenueAdminConfig,
    tz: Tz,
    date: NaiveDate,
    start_time: NaiveTime,
    now: DateTime<Utc>,
) -> Result<(), PolicyViolation> {
    if config.blackout_dates.contains(&date) {
        return Err(PolicyViolation::Blackout { date });
    }
    if config.holiday_dates.contains(&date) {
        return Err(PolicyViolation::Holiday { date });
    }

    let local_now = now.with_timezone(&tz);

    if let Some(cutoff) = config.same_day_cutoff_time
        && date == local_now.date_naive()
        && local_now.time() >= cutoff
    {
        return Err(PolicyViolation::SameDayCutoff { cutoff });
    }

    if config.min_advance_lead_time_hours > 0 {
        let slot_start = local_to_utc(tz, date, start_time);
        if slot_start - now < Duration::hours(config.min_advance_lead_time_hours as i64) {
            return Err(PolicyViolation::LeadTime { hours: config.min_advance_lead_time_hours });
        }
    }

    Ok(())
}
