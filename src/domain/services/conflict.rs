use std::sync::Arc;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::models::{
    availability::ExternalAvailabilityBlock,
    booking::{Booking, ConflictCheck, ConflictType, RecurringBooking},
    venue::Venue,
};
use crate::domain::ports::{BookingRepository, ExternalBlockRepository, SlotInstanceRepository, VenueRepository};
use crate::domain::services::time_range::{local_to_utc, MinuteRange};
use crate::error::AppError;

/// Decides whether a booking may be placed on a venue interval.
pub struct ConflictChecker {
    venue_repo: Arc<dyn VenueRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    slot_repo: Arc<dyn SlotInstanceRepository>,
    block_repo: Arc<dyn ExternalBlockRepository>,
}

impl ConflictChecker {
    pub fn new(
        venue_repo: Arc<dyn VenueRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        slot_repo: Arc<dyn SlotInstanceRepository>,
        block_repo: Arc<dyn ExternalBlockRepository>,
    ) -> Self {
        Self { venue_repo, booking_repo, slot_repo, block_repo }
    }

    pub async fn check_conflicts(
        &self,
        venue_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_booking_id: Option<&str>,
    ) -> Result<ConflictCheck, AppError> {
        let venue = self.venue_repo.find_by_id(venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
        self.check_for_venue(&venue, date, start_time, end_time, exclude_booking_id).await
    }

    pub async fn check_for_venue(
        &self,
        venue: &Venue,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_booking_id: Option<&str>,
    ) -> Result<ConflictCheck, AppError> {
        if end_time <= start_time {
            return Err(AppError::BadRequest("end_time must be after start_time".into()));
        }

        // A regular booking needs an explicitly generated, still active slot.
        let instance = self.slot_repo
            .find_exact_active(&venue.id, date, start_time, end_time, venue.booking_action_type())
            .await?;
        if instance.is_none() {
            debug!(venue_id = %venue.id, %date, %start_time, %end_time, "No matching slot instance");
            return Ok(ConflictCheck::conflict(
                ConflictType::SlotUnavailable,
                "This time slot is not available for booking",
            ));
        }

        let requested = MinuteRange::from_times(start_time, end_time);

        let bookings = self.booking_repo.list_active_by_range(&venue.id, date, date).await?;
        if let Some(existing) = overlapping_booking(&bookings, date, requested, exclude_booking_id) {
            return Ok(ConflictCheck::conflict(
                ConflictType::BookingOverlap,
                format!("Overlaps an existing booking from {} to {}", existing.start_time, existing.end_time),
            ));
        }

        let recurring = self.booking_repo.list_active_recurring_by_range(&venue.id, date, date).await?;
        if let Some(existing) = overlapping_occurrence(&recurring, date, requested, exclude_booking_id) {
            return Ok(ConflictCheck::conflict(
                ConflictType::RecurringOverlap,
                format!("Overlaps a recurring booking from {} to {}", existing.start_time, existing.end_time),
            ));
        }

        let tz = venue.tz();
        let blocks = self.block_repo
            .list_overlapping(&venue.id, local_to_utc(tz, date, start_time), local_to_utc(tz, date, end_time))
            .await?;
        if blocks.iter().any(|b| block_overlaps(b, tz, date.and_time(start_time), date.and_time(end_time))) {
            return Ok(ConflictCheck::conflict(
                ConflictType::SlotUnavailable,
                "This time slot is blocked on the venue calendar",
            ));
        }

        Ok(ConflictCheck::clear())
    }

    /// Checks the recurring dates of a new booking against active bookings,
    /// other occurrences and calendar blocks. Occurrences are not gated on
    /// slot instances. The first clash found is reported with its date.
    pub async fn check_occurrences(
        &self,
        venue: &Venue,
        dates: &[NaiveDate],
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<ConflictCheck, AppError> {
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return Ok(ConflictCheck::clear());
        };

        let bookings = self.booking_repo.list_active_by_range(&venue.id, first, last).await?;
        let recurring = self.booking_repo.list_active_recurring_by_range(&venue.id, first, last).await?;
        let tz = venue.tz();
        let blocks = self.block_repo
            .list_overlapping(&venue.id, local_to_utc(tz, first, start_time), local_to_utc(tz, last, end_time))
            .await?;

        let requested = MinuteRange::from_times(start_time, end_time);
        for &date in dates {
            if let Some(existing) = overlapping_booking(&bookings, date, requested, None) {
                return Ok(ConflictCheck::conflict(
                    ConflictType::BookingOverlap,
                    format!("Recurring date {} overlaps an existing booking from {} to {}", date, existing.start_time, existing.end_time),
                ));
            }
            if let Some(existing) = overlapping_occurrence(&recurring, date, requested, None) {
                return Ok(ConflictCheck::conflict(
                    ConflictType::RecurringOverlap,
                    format!("Recurring date {} overlaps a recurring booking from {} to {}", date, existing.start_time, existing.end_time),
                ));
            }
            if blocks.iter().any(|b| block_overlaps(b, tz, date.and_time(start_time), date.and_time(end_time))) {
                debug!(venue_id = %venue.id, %date, "Recurring date blocked by calendar");
                return Ok(ConflictCheck::conflict(
                    ConflictType::SlotUnavailable,
                    format!("Recurring date {} is blocked on the venue calendar", date),
                ));
            }
        }

        Ok(ConflictCheck::clear())
    }
}

fn overlapping_booking<'a>(
    bookings: &'a [Booking],
    date: NaiveDate,
    requested: MinuteRange,
    exclude: Option<&str>,
) -> Option<&'a Booking> {
    bookings.iter()
        .filter(|b| b.status.is_active() && b.date == date)
        .filter(|b| exclude != Some(b.id.as_str()))
        .find(|b| MinuteRange::from_times(b.start_time, b.end_time).overlaps(&requested))
}

fn overlapping_occurrence<'a>(
    recurring: &'a [RecurringBooking],
    date: NaiveDate,
    requested: MinuteRange,
    exclude: Option<&str>,
) -> Option<&'a RecurringBooking> {
    recurring.iter()
        .filter(|r| r.status.is_active() && r.date == date)
        .filter(|r| exclude != Some(r.id.as_str()) && exclude != Some(r.parent_booking_id.as_str()))
        .find(|r| MinuteRange::from_times(r.start_time, r.end_time).overlaps(&requested))
}

/// Compares an absolute calendar block against a venue-local interval.
pub fn block_overlaps(block: &ExternalAvailabilityBlock, tz: Tz, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    if block.status == "cancelled" {
        return false;
    }
    let block_start = block.start_at.with_timezone(&tz).naive_local();
    let block_end = block.end_at.with_timezone(&tz).naive_local();
    block_start < end && block_end > start
}
