use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::domain::models::{
    audit_log::AuditAction,
    auth::{Identity, Role},
    booking::{
        Booking, BookingFilter, BookingStatus, BookingWithFlow, ConflictType, NewBookingParams,
        RecurringBooking, RecurringType, TimeView,
    },
    payment::{round_cents, PaymentStatus},
    venue::{Venue, VenueAdminConfig},
};
use crate::domain::ports::{AdminConfigRepository, BookingRepository, PaymentRepository, VenueRepository};
use crate::domain::services::{
    audit::AuditLogger,
    conflict::ConflictChecker,
    payment_service::PaymentService,
    policy,
    time_range::local_to_utc,
};
use crate::error::AppError;

pub const CANCELLATION_WINDOW_HOURS: i64 = 48;
pub const DEFAULT_RECURRING_HORIZON_DAYS: i64 = 90;

const BOOKINGS_TABLE: &str = "bookings";

#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurring_type: RecurringType,
    pub recurring_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub venue_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub role_view: Option<Role>,
    pub time_view: Option<TimeView>,
}

/// Dates of the occurrences after `start`, up to and including `end`.
pub fn recurrence_dates(start: NaiveDate, kind: RecurringType, end: NaiveDate) -> Vec<NaiveDate> {
    match kind {
        RecurringType::None => Vec::new(),
        RecurringType::Weekly => (1i64..)
            .map(|n| start + Duration::weeks(n))
            .take_while(|d| *d <= end)
            .collect(),
        // Offsets are taken from the first date so month-end clamping does not drift.
        RecurringType::Monthly => (1u32..)
            .map_while(|n| start.checked_add_months(Months::new(n)))
            .take_while(|d| *d <= end)
            .collect(),
    }
}

/// True while the booking may still be cancelled.
pub fn within_cancellation_window(start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < start - Duration::hours(CANCELLATION_WINDOW_HOURS)
}

pub fn is_upcoming(booking: &Booking, tz: Tz, now: DateTime<Utc>) -> bool {
    local_to_utc(tz, booking.date, booking.start_time) >= now
}

pub struct BookingService {
    venue_repo: Arc<dyn VenueRepository>,
    config_repo: Arc<dyn AdminConfigRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    conflicts: Arc<ConflictChecker>,
    payments: Arc<PaymentService>,
    audit: Arc<AuditLogger>,
}

impl BookingService {
    pub fn new(
        venue_repo: Arc<dyn VenueRepository>,
        config_repo: Arc<dyn AdminConfigRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        conflicts: Arc<ConflictChecker>,
        payments: Arc<PaymentService>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self { venue_repo, config_repo, booking_repo, payment_repo, conflicts, payments, audit }
    }

    async fn load(&self, booking_id: &str) -> Result<(Booking, Venue), AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let venue = self.venue_repo.find_by_id(&booking.venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
        Ok((booking, venue))
    }

    pub async fn create_booking(&self, input: CreateBookingInput, identity: &Identity) -> Result<BookingWithFlow, AppError> {
        if input.end_time <= input.start_time {
            return Err(AppError::BadRequest("end_time must be after start_time".into()));
        }

        let venue = self.venue_repo.find_by_id(&input.venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;

        let tz = venue.tz();
        let now = Utc::now();
        let today = now.with_timezone(&tz).date_naive();
        if input.date < today {
            return Err(AppError::BadRequest("Cannot book a date in the past".into()));
        }
        if input.date > today + Duration::days(venue.max_advance_booking_days as i64) {
            return Err(AppError::BadRequest(format!(
                "Bookings can only be made up to {} days in advance", venue.max_advance_booking_days
            )));
        }

        let config = self.config_repo.find_by_venue(&venue.id).await?
            .unwrap_or_else(|| VenueAdminConfig::permissive(venue.id.clone()));
        policy::check_slot(&config, tz, input.date, input.start_time, now)
            .map_err(|violation| AppError::BadRequest(violation.to_string()))?;

        let check = self.conflicts
            .check_for_venue(&venue, input.date, input.start_time, input.end_time, None)
            .await?;
        if check.has_conflict {
            return Err(AppError::Conflict {
                message: check.message.unwrap_or_else(|| "This time slot is not available".into()),
                conflict_type: check.conflict_type,
            });
        }

        let duration_hours = (input.end_time - input.start_time).num_minutes() as f64 / 60.0;
        let recurring_end_date = match input.recurring_type {
            RecurringType::None => None,
            _ => {
                let end = input.recurring_end_date
                    .unwrap_or(input.date + Duration::days(DEFAULT_RECURRING_HORIZON_DAYS));
                if end < input.date {
                    return Err(AppError::BadRequest("recurring_end_date must not be before the booking date".into()));
                }
                Some(end)
            }
        };

        let occurrence_dates = recurring_end_date
            .map(|end| recurrence_dates(input.date, input.recurring_type, end))
            .unwrap_or_default();
        let check = self.conflicts
            .check_occurrences(&venue, &occurrence_dates, input.start_time, input.end_time)
            .await?;
        if check.has_conflict {
            return Err(AppError::Conflict {
                message: check.message.unwrap_or_else(|| "A recurring date is not available".into()),
                conflict_type: check.conflict_type,
            });
        }

        let booking = Booking::new(NewBookingParams {
            venue_id: venue.id.clone(),
            renter_id: identity.user_id.clone(),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            total_amount: round_cents(duration_hours * venue.hourly_rate),
            insurance_required: venue.insurance_required,
            recurring_type: input.recurring_type,
            recurring_end_date,
            notes: input.notes,
        });

        let occurrences: Vec<RecurringBooking> = occurrence_dates
            .into_iter()
            .map(|date| booking.occurrence(date))
            .collect();

        let created = self.booking_repo.create(&booking, &occurrences).await.map_err(|e| {
            if e.is_unique_violation() {
                AppError::conflict(ConflictType::SlotUnavailable, "This time slot was just booked by someone else")
            } else {
                e
            }
        })?;
        self.audit.record(BOOKINGS_TABLE, &created.id, AuditAction::Create, Some(&identity.user_id), None, Some(&created)).await;

        info!(booking_id = %created.id, venue_id = %venue.id, occurrences = occurrences.len(), "Booking created");
        Ok(BookingWithFlow {
            requires_immediate_payment: venue.requires_immediate_payment(),
            awaiting_owner_approval: !venue.instant_booking,
            awaiting_insurance_approval: venue.insurance_required && !created.insurance_approved,
            recurring_instances: occurrences.len(),
            booking: created,
        })
    }

    pub async fn get_booking(&self, booking_id: &str, identity: &Identity) -> Result<Booking, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_party(identity, &booking, &venue)?;
        Ok(booking)
    }

    pub async fn list_recurring_instances(&self, booking_id: &str, identity: &Identity) -> Result<Vec<RecurringBooking>, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_party(identity, &booking, &venue)?;
        self.booking_repo.list_recurring_by_parent(&booking.id).await
    }

    pub async fn cancel_booking(&self, booking_id: &str, identity: &Identity) -> Result<Booking, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_party(identity, &booking, &venue)?;

        match booking.status {
            BookingStatus::Cancelled => return Err(AppError::BadRequest("Booking is already cancelled".into())),
            BookingStatus::Completed => return Err(AppError::BadRequest("Completed bookings cannot be cancelled".into())),
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        let start = local_to_utc(venue.tz(), booking.date, booking.start_time);
        if !within_cancellation_window(start, Utc::now()) {
            return Err(AppError::BadRequest(format!(
                "Bookings can only be cancelled at least {} hours before the start time", CANCELLATION_WINDOW_HOURS
            )));
        }

        let cancelled = self.booking_repo.update_status(&booking.id, BookingStatus::Cancelled).await?;
        self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Update, Some(&identity.user_id), Some(&booking), Some(&cancelled)).await;

        if let Err(e) = self.payments.release_authorization(&booking.id, Some(&identity.user_id)).await {
            warn!(booking_id, "Failed to release authorization after cancel: {}", e);
        }
        // The owner can retry a failed refund through the refund route.
        match self.payments.refund_paid(&booking.id, Some(&identity.user_id)).await {
            Ok(Some(refund)) => info!(booking_id, refund_id = %refund.refund_id, amount = refund.amount, "Refunded on cancel"),
            Ok(None) => {}
            Err(e) => warn!(booking_id, "Refund after cancel failed: {}", e),
        }

        info!(booking_id, "Booking cancelled");
        Ok(cancelled)
    }

    pub async fn confirm_booking(&self, booking_id: &str, identity: &Identity) -> Result<Booking, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_manager(identity, &venue)?;

        if booking.status != BookingStatus::Pending {
            return Err(AppError::BadRequest(format!("Cannot confirm a booking with status {:?}", booking.status)));
        }
        if venue.insurance_required && !booking.insurance_approved {
            return Err(AppError::BadRequest("Insurance must be approved before the booking can be confirmed".into()));
        }

        let confirmed = self.booking_repo.update_status(&booking.id, BookingStatus::Confirmed).await?;
        self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Update, Some(&identity.user_id), Some(&booking), Some(&confirmed)).await;

        info!(booking_id, "Booking confirmed");
        Ok(confirmed)
    }

    pub async fn approve_insurance(&self, booking_id: &str, identity: &Identity) -> Result<Booking, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_manager(identity, &venue)?;

        if !booking.status.is_active() {
            return Err(AppError::BadRequest(format!("Cannot approve insurance for a booking with status {:?}", booking.status)));
        }
        if booking.insurance_approved {
            return Ok(booking);
        }

        let approved = self.booking_repo.approve_insurance(&booking.id).await?;
        self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Update, Some(&identity.user_id), Some(&booking), Some(&approved)).await;
        Ok(approved)
    }

    /// Hard-deletes a booking abandoned before payment.
    pub async fn delete_unpaid_booking(&self, booking_id: &str, identity: &Identity) -> Result<(), AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if booking.renter_id != identity.user_id {
            return Err(AppError::BadRequest("Permission denied: only the renter can discard an unpaid booking".into()));
        }
        let payment = self.payment_repo.find_by_booking(&booking.id).await?;
        if payment.as_ref().is_some_and(|p| p.status == PaymentStatus::Paid) {
            return Err(AppError::BadRequest("Booking has already been paid. Use cancel instead.".into()));
        }
        if booking.status != BookingStatus::Pending {
            return Err(AppError::BadRequest("Only pending bookings can be deleted".into()));
        }
        if payment.is_some_and(|p| p.status == PaymentStatus::Authorized) {
            self.payments.release_authorization(&booking.id, Some(&identity.user_id)).await?;
        }

        // The audit entry must exist before the row disappears.
        self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Delete, Some(&identity.user_id), Some(&booking), None).await;
        self.booking_repo.delete(&booking.id).await?;

        info!(booking_id, "Unpaid booking deleted");
        Ok(())
    }

    pub async fn list_bookings(&self, query: ListBookingsQuery, identity: &Identity) -> Result<Vec<Booking>, AppError> {
        let mut filter = BookingFilter {
            status: query.status,
            date_from: query.date_from,
            date_to: query.date_to,
            ..Default::default()
        };

        match identity.role.view_as(query.role_view) {
            Role::Admin => {
                filter.venue_id = query.venue_id;
            }
            Role::VenueOwner => {
                let owned: Vec<String> = self.venue_repo.list_by_owner(&identity.user_id).await?
                    .into_iter()
                    .map(|v| v.id)
                    .collect();
                filter.venue_ids = Some(match query.venue_id {
                    Some(venue_id) if owned.contains(&venue_id) => vec![venue_id],
                    Some(_) => Vec::new(),
                    None => owned,
                });
            }
            Role::Renter => {
                filter.renter_id = Some(identity.user_id.clone());
                filter.venue_id = query.venue_id;
            }
        }

        let bookings = self.booking_repo.list(&filter).await?;
        let Some(view) = query.time_view else {
            return Ok(bookings);
        };

        let mut zones: HashMap<String, Tz> = HashMap::new();
        for booking in &bookings {
            if !zones.contains_key(&booking.venue_id) {
                let tz = self.venue_repo.find_by_id(&booking.venue_id).await?
                    .map(|v| v.tz())
                    .unwrap_or(chrono_tz::UTC);
                zones.insert(booking.venue_id.clone(), tz);
            }
        }

        let now = Utc::now();
        Ok(bookings.into_iter()
            .filter(|b| {
                let tz = zones.get(&b.venue_id).copied().unwrap_or(chrono_tz::UTC);
                match view {
                    TimeView::Upcoming => is_upcoming(b, tz, now),
                    TimeView::Past => !is_upcoming(b, tz, now),
                }
            })
            .collect())
    }
}

/// Renter, venue owner or admin.
fn authorize_party(identity: &Identity, booking: &Booking, venue: &Venue) -> Result<(), AppError> {
    if booking.renter_id == identity.user_id || venue.is_owned_by(&identity.user_id) || identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::BadRequest("Permission denied".into()))
    }
}

/// Venue owner or admin.
fn authorize_manager(identity: &Identity, venue: &Venue) -> Result<(), AppError> {
    if venue.is_owned_by(&identity.user_id) || identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::BadRequest("Permission denied: only the venue owner or an admin can do this".into()))
    }
}
