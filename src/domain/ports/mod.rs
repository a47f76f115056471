use crate::domain::models::{
    venue::{Venue, VenueAdminConfig},
    availability::{Availability, ExternalAvailabilityBlock},
    slot_instance::{SlotActionType, SlotInstance, SlotModalContent, SlotPricing},
    booking::{Booking, BookingFilter, BookingStatus, RecurringBooking},
    payment::Payment,
    audit_log::AuditLog,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create(&self, venue: &Venue) -> Result<Venue, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>, AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Venue>, AppError>;
}

#[async_trait]
pub trait AdminConfigRepository: Send + Sync {
    async fn find_by_venue(&self, venue_id: &str) -> Result<Option<VenueAdminConfig>, AppError>;
    async fn upsert(&self, config: &VenueAdminConfig) -> Result<VenueAdminConfig, AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn create(&self, availability: &Availability) -> Result<Availability, AppError>;
    async fn list_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Availability>, AppError>;
}

#[async_trait]
pub trait SlotInstanceRepository: Send + Sync {
    async fn create(&self, instance: &SlotInstance) -> Result<SlotInstance, AppError>;
    async fn list_active_by_type(&self, venue_id: &str, from: NaiveDate, to: NaiveDate, action_type: SlotActionType) -> Result<Vec<SlotInstance>, AppError>;
    async fn find_exact_active(
        &self,
        venue_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        action_type: SlotActionType,
    ) -> Result<Option<SlotInstance>, AppError>;
    async fn upsert_pricing(&self, pricing: &SlotPricing) -> Result<(), AppError>;
    async fn list_pricing(&self, slot_instance_ids: &[String]) -> Result<Vec<SlotPricing>, AppError>;
    async fn upsert_modal_content(&self, content: &SlotModalContent) -> Result<(), AppError>;
    async fn find_modal_content(&self, action_type: SlotActionType) -> Result<Option<SlotModalContent>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking and its recurring occurrences atomically.
    async fn create(&self, booking: &Booking, occurrences: &[RecurringBooking]) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    async fn list_active_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError>;
    async fn list_active_recurring_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<RecurringBooking>, AppError>;
    async fn list_recurring_by_parent(&self, parent_booking_id: &str) -> Result<Vec<RecurringBooking>, AppError>;
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError>;
    async fn approve_insurance(&self, id: &str) -> Result<Booking, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Payment>, AppError>;
    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Payment>, AppError>;
    /// Create-or-replace keyed on `booking_id`.
    async fn upsert(&self, payment: &Payment) -> Result<Payment, AppError>;
}

#[async_trait]
pub trait ExternalBlockRepository: Send + Sync {
    async fn create(&self, block: &ExternalAvailabilityBlock) -> Result<ExternalAvailabilityBlock, AppError>;
    async fn list_overlapping(&self, venue_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ExternalAvailabilityBlock>, AppError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &AuditLog) -> Result<(), AppError>;
    async fn list_for_record(&self, table_name: &str, record_id: &str) -> Result<Vec<AuditLog>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PaymentMetadata {
    pub booking_id: String,
    pub payment_id: String,
    pub venue_id: String,
    pub renter_id: String,
}

#[derive(Debug, Clone)]
pub struct ProviderIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct SavedPaymentMethod {
    pub payment_method_id: String,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderRefund {
    pub id: String,
    pub amount_minor: i64,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    pub payment_intent_id: Option<String>,
    pub booking_id: Option<String>,
}

/// Card-payment capability. Amounts are in minor currency units.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(&self, amount_minor: i64, currency: &str, metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError>;
    async fn create_setup_intent(&self, metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError>;
    async fn retrieve_setup_intent(&self, setup_intent_id: &str) -> Result<Option<SavedPaymentMethod>, AppError>;
    /// Creates and confirms an off-session charge against a saved method.
    async fn charge_off_session(
        &self,
        amount_minor: i64,
        currency: &str,
        method: &SavedPaymentMethod,
        metadata: &PaymentMetadata,
    ) -> Result<ProviderIntent, AppError>;
    async fn cancel_setup_intent(&self, setup_intent_id: &str) -> Result<(), AppError>;
    async fn refund(&self, payment_intent_id: &str, amount_minor: i64) -> Result<ProviderRefund, AppError>;
    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError>;
}
