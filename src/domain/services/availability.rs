use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::domain::models::{
    auth::Identity,
    availability::Availability,
    booking::{Booking, RecurringBooking},
    slot_instance::{
        PricingPaymentMethod, PricingUnit, SlotActionType, SlotInstance, SlotModalContent,
        SlotPricing, UnifiedSlot,
    },
    venue::{Venue, VenueAdminConfig},
};
use crate::domain::ports::{
    AdminConfigRepository, AvailabilityRepository, BookingRepository, SlotInstanceRepository,
    VenueRepository,
};
use crate::domain::services::policy;
use crate::domain::services::time_range::{bookable_gaps, subtract_busy_from_free, MinuteRange};
use crate::error::AppError;

/// Legacy boilerplate bullets that must never reach renters.
pub const DISALLOWED_MODAL_BULLETS: &[&str] = &[
    "No reservation required",
    "First come, first served",
    "Bring your own ball",
];

const MAX_RANGE_DAYS: i64 = 366;

/// Active bookings and recurring occurrences grouped by date, each list sorted by start.
pub fn busy_by_date(bookings: &[Booking], recurring: &[RecurringBooking]) -> HashMap<NaiveDate, Vec<MinuteRange>> {
    let mut busy: HashMap<NaiveDate, Vec<MinuteRange>> = HashMap::new();

    let booked = bookings.iter()
        .filter(|b| b.status.is_active())
        .map(|b| (b.date, MinuteRange::from_times(b.start_time, b.end_time)));
    let occurrences = recurring.iter()
        .filter(|r| r.status.is_active())
        .map(|r| (r.date, MinuteRange::from_times(r.start_time, r.end_time)));

    for (date, range) in booked.chain(occurrences) {
        busy.entry(date).or_default().push(range);
    }
    for ranges in busy.values_mut() {
        ranges.sort();
    }
    busy
}

/// Gap-fills each open availability window around the busy ranges on its date.
pub fn regular_slots(
    venue: &Venue,
    availabilities: &[Availability],
    busy: &HashMap<NaiveDate, Vec<MinuteRange>>,
) -> Vec<UnifiedSlot> {
    let action_type = venue.booking_action_type();
    let no_busy = Vec::new();

    availabilities.iter()
        .filter(|a| a.is_available)
        .flat_map(|a| {
            let window = MinuteRange::from_times(a.start_time, a.end_time);
            let day_busy = busy.get(&a.date).unwrap_or(&no_busy);
            let gaps = subtract_busy_from_free(window, day_busy);

            bookable_gaps(&gaps).into_iter().map(move |gap| UnifiedSlot {
                date: a.date,
                start_time: gap.start_time(),
                end_time: gap.end_time(),
                venue_id: a.venue_id.clone(),
                availability_id: Some(a.id.clone()),
                slot_instance_id: None,
                action_type,
                modal_content: None,
                slot_pricing: None,
            })
        })
        .collect()
}

pub fn apply_policy(slots: Vec<UnifiedSlot>, config: &VenueAdminConfig, tz: Tz, now: DateTime<Utc>) -> Vec<UnifiedSlot> {
    slots.into_iter()
        .filter(|s| match policy::check_slot(config, tz, s.date, s.start_time, now) {
            Ok(()) => true,
            Err(violation) => {
                debug!(date = %s.date, start = %s.start_time, "Slot filtered by policy: {}", violation);
                false
            }
        })
        .collect()
}

/// Drops regular slots that overlap an inventory-blocking info-only session.
pub fn remove_blocked(slots: Vec<UnifiedSlot>, info_instances: &[SlotInstance]) -> Vec<UnifiedSlot> {
    let blockers: Vec<(NaiveDate, MinuteRange)> = info_instances.iter()
        .filter(|i| i.is_active && i.blocks_inventory)
        .map(|i| (i.date, MinuteRange::from_times(i.start_time, i.end_time)))
        .collect();

    slots.into_iter()
        .filter(|s| {
            let range = MinuteRange::from_times(s.start_time, s.end_time);
            !blockers.iter().any(|(date, blocker)| *date == s.date && range.overlaps(blocker))
        })
        .collect()
}

pub fn sanitize_modal(content: &SlotModalContent) -> SlotModalContent {
    let mut cleaned = content.clone();
    cleaned.bullet_points.retain(|bullet| {
        !DISALLOWED_MODAL_BULLETS.iter().any(|banned| bullet.trim().eq_ignore_ascii_case(banned))
    });
    cleaned
}

pub fn info_only_slots(
    instances: &[SlotInstance],
    pricing: &HashMap<String, SlotPricing>,
    modal: Option<&SlotModalContent>,
    config: &VenueAdminConfig,
    currency: &str,
) -> Vec<UnifiedSlot> {
    let modal_content = modal.map(sanitize_modal);

    instances.iter()
        .filter(|i| i.is_active)
        .map(|i| {
            let slot_pricing = pricing.get(&i.id).cloned().or_else(|| {
                match (config.drop_in_enabled, config.drop_in_price) {
                    (true, Some(amount)) => Some(SlotPricing {
                        slot_instance_id: i.id.clone(),
                        amount,
                        currency: currency.to_string(),
                        unit: PricingUnit::Person,
                        payment_method: PricingPaymentMethod::OnSite,
                    }),
                    _ => None,
                }
            });

            UnifiedSlot {
                date: i.date,
                start_time: i.start_time,
                end_time: i.end_time,
                venue_id: i.venue_id.clone(),
                availability_id: None,
                slot_instance_id: Some(i.id.clone()),
                action_type: i.action_type,
                modal_content: modal_content.clone(),
                slot_pricing,
            }
        })
        .collect()
}

pub fn merge_sorted(mut regular: Vec<UnifiedSlot>, info: Vec<UnifiedSlot>) -> Vec<UnifiedSlot> {
    regular.extend(info);
    regular.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
    regular
}

pub(crate) fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<(), AppError> {
    if to < from {
        return Err(AppError::BadRequest("date_to must not be before date_from".into()));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!("Date range cannot exceed {} days", MAX_RANGE_DAYS)));
    }
    Ok(())
}

pub struct AvailabilityService {
    venue_repo: Arc<dyn VenueRepository>,
    config_repo: Arc<dyn AdminConfigRepository>,
    availability_repo: Arc<dyn AvailabilityRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    slot_repo: Arc<dyn SlotInstanceRepository>,
    currency: String,
}

impl AvailabilityService {
    pub fn new(
        venue_repo: Arc<dyn VenueRepository>,
        config_repo: Arc<dyn AdminConfigRepository>,
        availability_repo: Arc<dyn AvailabilityRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        slot_repo: Arc<dyn SlotInstanceRepository>,
        currency: String,
    ) -> Self {
        Self { venue_repo, config_repo, availability_repo, booking_repo, slot_repo, currency }
    }

    pub async fn get_available_slots(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<UnifiedSlot>, AppError> {
        validate_range(from, to)?;

        let venue = self.venue_repo.find_by_id(venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
        let config = self.config_repo.find_by_venue(venue_id).await?
            .unwrap_or_else(|| VenueAdminConfig::permissive(venue_id));

        let availabilities = self.availability_repo.list_by_range(venue_id, from, to).await?;
        let bookings = self.booking_repo.list_active_by_range(venue_id, from, to).await?;
        let recurring = self.booking_repo.list_active_recurring_by_range(venue_id, from, to).await?;
        let info_instances = self.slot_repo
            .list_active_by_type(venue_id, from, to, SlotActionType::InfoOnlyOpenGym).await?;

        let ids: Vec<String> = info_instances.iter().map(|i| i.id.clone()).collect();
        let pricing: HashMap<String, SlotPricing> = self.slot_repo.list_pricing(&ids).await?
            .into_iter()
            .map(|p| (p.slot_instance_id.clone(), p))
            .collect();
        let modal = if info_instances.is_empty() {
            None
        } else {
            self.slot_repo.find_modal_content(SlotActionType::InfoOnlyOpenGym).await?
        };

        let busy = busy_by_date(&bookings, &recurring);
        let regular = regular_slots(&venue, &availabilities, &busy);
        let regular = apply_policy(regular, &config, venue.tz(), Utc::now());
        let regular = remove_blocked(regular, &info_instances);
        let info = info_only_slots(&info_instances, &pricing, modal.as_ref(), &config, &self.currency);

        let slots = merge_sorted(regular, info);
        debug!(venue_id, %from, %to, count = slots.len(), "Computed available slots");
        Ok(slots)
    }

    /// Materializes a regular slot instance for every slot the computation
    /// currently offers, so each offered slot finds an exact match when booked.
    /// Policy is left to the booking gate since it depends on the clock.
    pub async fn generate_slot_instances(
        &self,
        venue_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        identity: &Identity,
    ) -> Result<Vec<SlotInstance>, AppError> {
        validate_range(from, to)?;

        let venue = self.venue_repo.find_by_id(venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
        if !identity.is_admin() && !venue.is_owned_by(&identity.user_id) {
            return Err(AppError::BadRequest("Permission denied: only the venue owner or an admin can generate slots".into()));
        }

        let availabilities = self.availability_repo.list_by_range(venue_id, from, to).await?;
        let bookings = self.booking_repo.list_active_by_range(venue_id, from, to).await?;
        let recurring = self.booking_repo.list_active_recurring_by_range(venue_id, from, to).await?;
        let info_instances = self.slot_repo
            .list_active_by_type(venue_id, from, to, SlotActionType::InfoOnlyOpenGym).await?;

        let busy = busy_by_date(&bookings, &recurring);
        let offered = remove_blocked(regular_slots(&venue, &availabilities, &busy), &info_instances);
        let mut created = Vec::new();

        for slot in offered {
            let existing = self.slot_repo.find_exact_active(
                venue_id, slot.date, slot.start_time, slot.end_time, slot.action_type,
            ).await?;
            if existing.is_some() {
                continue;
            }
            let instance = SlotInstance::new(
                venue_id.to_string(), slot.date, slot.start_time, slot.end_time, slot.action_type, false,
            );
            created.push(self.slot_repo.create(&instance).await?);
        }

        info!(venue_id, count = created.len(), "Generated slot instances");
        Ok(created)
    }
}
