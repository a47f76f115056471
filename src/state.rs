use std::sync::Arc;
use crate::domain::ports::{
    AdminConfigRepository, AuditLogRepository, AvailabilityRepository, BookingRepository,
    ExternalBlockRepository, PaymentProvider, PaymentRepository, SlotInstanceRepository,
    VenueRepository,
};
use crate::domain::services::{
    audit::AuditLogger, availability::AvailabilityService, booking_service::BookingService,
    conflict::ConflictChecker, payment_service::PaymentService,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub venue_repo: Arc<dyn VenueRepository>,
    pub admin_config_repo: Arc<dyn AdminConfigRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub slot_repo: Arc<dyn SlotInstanceRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub block_repo: Arc<dyn ExternalBlockRepository>,
    pub audit_repo: Arc<dyn AuditLogRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub availability_service: Arc<AvailabilityService>,
    pub conflict_checker: Arc<ConflictChecker>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub audit: Arc<AuditLogger>,
}
