use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::{
    audit_log::AuditAction,
    auth::Identity,
    booking::{Booking, BookingStatus},
    payment::{CaptureResult, IntentResponse, Payment, PaymentStatus, RefundResult},
    venue::Venue,
};
use crate::domain::ports::{BookingRepository, PaymentMetadata, PaymentProvider, PaymentRepository, VenueRepository};
use crate::domain::services::audit::AuditLogger;
use crate::error::AppError;

const PAYMENTS_TABLE: &str = "payments";
const BOOKINGS_TABLE: &str = "bookings";

#[derive(Debug, Serialize, Clone)]
pub struct PaymentSuccess {
    pub payment: Payment,
    pub booking: Booking,
}

pub struct PaymentService {
    booking_repo: Arc<dyn BookingRepository>,
    venue_repo: Arc<dyn VenueRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    audit: Arc<AuditLogger>,
    currency: String,
    platform_fee_percent: f64,
}

impl PaymentService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        venue_repo: Arc<dyn VenueRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        provider: Arc<dyn PaymentProvider>,
        audit: Arc<AuditLogger>,
        currency: String,
        platform_fee_percent: f64,
    ) -> Self {
        Self { booking_repo, venue_repo, payment_repo, provider, audit, currency, platform_fee_percent }
    }

    async fn load(&self, booking_id: &str) -> Result<(Booking, Venue), AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let venue = self.venue_repo.find_by_id(&booking.venue_id).await?
            .ok_or(AppError::NotFound("Venue not found".into()))?;
        Ok((booking, venue))
    }

    /// Fresh payment row for the booking, keeping the id of any prior attempt.
    fn payment_for(&self, booking: &Booking, existing: Option<&Payment>) -> Payment {
        let mut payment = Payment::new(
            booking.id.clone(),
            booking.renter_id.clone(),
            booking.venue_id.clone(),
            booking.total_amount,
            self.platform_fee_percent,
            self.currency.clone(),
        );
        if let Some(prior) = existing {
            payment.id = prior.id.clone();
            payment.created_at = prior.created_at;
        }
        payment
    }

    fn metadata(payment: &Payment) -> PaymentMetadata {
        PaymentMetadata {
            booking_id: payment.booking_id.clone(),
            payment_id: payment.id.clone(),
            venue_id: payment.venue_id.clone(),
            renter_id: payment.renter_id.clone(),
        }
    }

    async fn save(&self, payment: &mut Payment, action: AuditAction, actor_id: Option<&str>, before: Option<&Payment>) -> Result<Payment, AppError> {
        payment.updated_at = Utc::now();
        let saved = self.payment_repo.upsert(payment).await?;
        self.audit.record(PAYMENTS_TABLE, &saved.id, action, actor_id, before, Some(&saved)).await;
        Ok(saved)
    }

    pub async fn create_payment_intent(&self, booking_id: &str, identity: &Identity) -> Result<IntentResponse, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        guard_payable(&booking)?;
        authorize_payer(identity, &booking, &venue)?;

        if venue.insurance_required && !booking.insurance_approved {
            return Err(AppError::BadRequest("Insurance must be approved before this booking can be paid".into()));
        }
        if !venue.requires_immediate_payment() {
            return Err(AppError::BadRequest("This venue requires card authorization; use the setup intent flow".into()));
        }

        let existing = self.payment_repo.find_by_booking(&booking.id).await?;
        if existing.as_ref().is_some_and(|p| p.status == PaymentStatus::Paid) {
            return Err(AppError::BadRequest("Booking has already been paid".into()));
        }

        let mut payment = self.payment_for(&booking, existing.as_ref());
        let intent = self.provider
            .create_payment_intent(payment.amount_minor_units(), &payment.currency, &Self::metadata(&payment))
            .await?;
        let client_secret = intent.client_secret
            .ok_or_else(|| AppError::Provider("Payment intent returned without client secret".into()))?;

        payment.stripe_payment_intent_id = Some(intent.id);
        let action = if existing.is_some() { AuditAction::Update } else { AuditAction::Create };
        let saved = self.save(&mut payment, action, Some(&identity.user_id), existing.as_ref()).await?;

        info!(booking_id, payment_id = %saved.id, amount = saved.amount, "Created payment intent");
        Ok(IntentResponse {
            client_secret,
            payment_id: saved.id,
            amount: saved.amount,
            setup_intent_id: None,
        })
    }

    pub async fn create_setup_intent(&self, booking_id: &str, identity: &Identity) -> Result<IntentResponse, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        guard_payable(&booking)?;
        authorize_payer(identity, &booking, &venue)?;

        if venue.requires_immediate_payment() {
            return Err(AppError::BadRequest("This venue charges immediately; use the payment intent flow".into()));
        }

        let existing = self.payment_repo.find_by_booking(&booking.id).await?;
        if existing.as_ref().is_some_and(|p| p.status == PaymentStatus::Paid) {
            return Err(AppError::BadRequest("Booking has already been paid".into()));
        }
        if let Some(prior_setup) = existing.as_ref()
            .filter(|p| p.status == PaymentStatus::Authorized)
            .and_then(|p| p.stripe_setup_intent_id.as_deref())
            && let Err(e) = self.provider.cancel_setup_intent(prior_setup).await
        {
            warn!(booking_id, setup_intent_id = prior_setup, "Could not release previous authorization: {}", e);
        }

        let mut payment = self.payment_for(&booking, existing.as_ref());
        let intent = self.provider.create_setup_intent(&Self::metadata(&payment)).await?;
        let client_secret = intent.client_secret
            .ok_or_else(|| AppError::Provider("Setup intent returned without client secret".into()))?;

        payment.status = PaymentStatus::Authorized;
        payment.stripe_setup_intent_id = Some(intent.id.clone());
        let action = if existing.is_some() { AuditAction::Update } else { AuditAction::Create };
        let saved = self.save(&mut payment, action, Some(&identity.user_id), existing.as_ref()).await?;

        info!(booking_id, payment_id = %saved.id, "Created setup intent");
        Ok(IntentResponse {
            client_secret,
            payment_id: saved.id,
            amount: saved.amount,
            setup_intent_id: Some(intent.id),
        })
    }

    /// Charges the card saved by a setup intent. A declined charge marks the
    /// payment failed and leaves the booking untouched.
    pub async fn capture_payment(&self, booking_id: &str, initiator: &Identity) -> Result<CaptureResult, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        if !initiator.is_admin() && !venue.is_owned_by(&initiator.user_id) {
            return Err(AppError::BadRequest("Permission denied: only the venue owner or an admin can capture payment".into()));
        }
        guard_payable(&booking)?;
        if venue.insurance_required && !booking.insurance_approved {
            return Err(AppError::BadRequest("Insurance must be approved before payment can be captured".into()));
        }

        let before = self.payment_repo.find_by_booking(&booking.id).await?
            .ok_or(AppError::NotFound("Payment not found".into()))?;
        match before.status {
            PaymentStatus::Authorized => {}
            PaymentStatus::Paid => return Err(AppError::BadRequest("Booking has already been paid".into())),
            other => return Err(AppError::BadRequest(format!("Payment cannot be captured from status {:?}", other))),
        }
        let setup_intent_id = before.stripe_setup_intent_id.clone()
            .ok_or_else(|| AppError::BadRequest("Payment has no card authorization".into()))?;

        let method = self.provider.retrieve_setup_intent(&setup_intent_id).await?
            .ok_or_else(|| AppError::BadRequest("No saved payment method on the authorization".into()))?;

        let mut payment = before.clone();
        let outcome = self.provider
            .charge_off_session(payment.amount_minor_units(), &payment.currency, &method, &Self::metadata(&payment))
            .await;

        let failure = match outcome {
            Ok(intent) if intent.status == "succeeded" => {
                payment.status = PaymentStatus::Paid;
                payment.paid_at = Some(Utc::now());
                payment.stripe_payment_intent_id = Some(intent.id.clone());
                let saved = self.save(&mut payment, AuditAction::Update, Some(&initiator.user_id), Some(&before)).await?;

                let confirmed = self.booking_repo.update_status(&booking.id, BookingStatus::Confirmed).await?;
                self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Update, Some(&initiator.user_id), Some(&booking), Some(&confirmed)).await;

                info!(booking_id, payment_id = %saved.id, "Captured payment");
                return Ok(CaptureResult {
                    payment_id: saved.id,
                    payment_intent_id: intent.id,
                    amount: saved.amount,
                    status: saved.status,
                });
            }
            Ok(intent) => {
                payment.stripe_payment_intent_id = Some(intent.id);
                format!("Charge ended in status {}", intent.status)
            }
            Err(e) => e.to_string(),
        };

        payment.status = PaymentStatus::Failed;
        self.save(&mut payment, AuditAction::Update, Some(&initiator.user_id), Some(&before)).await?;
        warn!(booking_id, "Payment capture failed: {}", failure);
        Err(AppError::PaymentFailed(failure))
    }

    pub async fn cancel_setup_intent(&self, booking_id: &str, identity: &Identity) -> Result<(), AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        authorize_payer(identity, &booking, &venue)?;
        self.release_authorization(&booking.id, Some(&identity.user_id)).await
    }

    /// Releases an outstanding card hold. Safe to call when there is none.
    pub async fn release_authorization(&self, booking_id: &str, actor_id: Option<&str>) -> Result<(), AppError> {
        let Some(before) = self.payment_repo.find_by_booking(booking_id).await? else {
            return Ok(());
        };
        if before.status != PaymentStatus::Authorized {
            return Ok(());
        }

        if let Some(setup_intent_id) = before.stripe_setup_intent_id.as_deref()
            && let Err(e) = self.provider.cancel_setup_intent(setup_intent_id).await
        {
            warn!(booking_id, setup_intent_id, "Ignoring setup intent cancellation error: {}", e);
        }

        let mut payment = before.clone();
        payment.status = PaymentStatus::Failed;
        self.save(&mut payment, AuditAction::Update, actor_id, Some(&before)).await?;
        info!(booking_id, "Released card authorization");
        Ok(())
    }

    /// Owner or admin retry of the refund for a booking that is already
    /// cancelled. Cancellation itself refunds through `refund_paid`.
    pub async fn process_refund(&self, booking_id: &str, identity: &Identity) -> Result<Option<RefundResult>, AppError> {
        let (booking, venue) = self.load(booking_id).await?;
        if !identity.is_admin() && !venue.is_owned_by(&identity.user_id) {
            return Err(AppError::BadRequest("Permission denied: only the venue owner or an admin can issue refunds".into()));
        }
        if booking.status != BookingStatus::Cancelled {
            return Err(AppError::BadRequest("Only cancelled bookings can be refunded".into()));
        }
        self.refund_paid(&booking.id, Some(&identity.user_id)).await
    }

    /// Full refund of a paid payment. Returns `None` when nothing was paid.
    pub async fn refund_paid(&self, booking_id: &str, actor_id: Option<&str>) -> Result<Option<RefundResult>, AppError> {
        let Some(before) = self.payment_repo.find_by_booking(booking_id).await? else {
            return Ok(None);
        };
        if before.status != PaymentStatus::Paid {
            return Ok(None);
        }
        let payment_intent_id = before.stripe_payment_intent_id.clone()
            .ok_or_else(|| AppError::BadRequest("Paid payment has no provider charge to refund".into()))?;

        let refund = self.provider.refund(&payment_intent_id, before.amount_minor_units()).await?;
        let refund_amount = refund.amount_minor as f64 / 100.0;

        let mut payment = before.clone();
        payment.status = PaymentStatus::Refunded;
        payment.refunded_at = Some(Utc::now());
        payment.refund_amount = Some(refund_amount);
        self.save(&mut payment, AuditAction::Update, actor_id, Some(&before)).await?;

        info!(booking_id, refund_id = %refund.id, "Refunded payment");
        Ok(Some(RefundResult {
            refund_id: refund.id,
            amount: refund_amount,
            status: refund.status,
        }))
    }

    /// Webhook entry point. Replays for a settled payment return the stored
    /// state without writing.
    pub async fn process_payment_success(&self, payment_intent_id: &str, checkout_session_id: Option<&str>) -> Result<PaymentSuccess, AppError> {
        let mut found = self.payment_repo.find_by_payment_intent(payment_intent_id).await?;

        if found.is_none()
            && let Some(session_id) = checkout_session_id
        {
            let session = self.provider.retrieve_checkout_session(session_id).await?;
            if let Some(booking_id) = session.booking_id {
                found = self.payment_repo.find_by_booking(&booking_id).await?;
            }
        }

        let before = found.ok_or(AppError::NotFound("Payment not found".into()))?;
        let booking = self.booking_repo.find_by_id(&before.booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if is_settled(before.status, booking.status) {
            info!(payment_id = %before.id, status = ?before.status, "Payment already settled");
            return Ok(PaymentSuccess { payment: before, booking });
        }

        let mut payment = before.clone();
        payment.status = PaymentStatus::Paid;
        payment.paid_at = Some(Utc::now());
        if payment.stripe_payment_intent_id.is_none() {
            payment.stripe_payment_intent_id = Some(payment_intent_id.to_string());
        }
        let payment = self.save(&mut payment, AuditAction::Update, None, Some(&before)).await?;

        let booking = if booking.status == BookingStatus::Pending {
            let confirmed = self.booking_repo.update_status(&booking.id, BookingStatus::Confirmed).await?;
            self.audit.record(BOOKINGS_TABLE, &booking.id, AuditAction::Update, None, Some(&booking), Some(&confirmed)).await;
            confirmed
        } else {
            warn!(booking_id = %booking.id, status = ?booking.status, "Payment succeeded for non-pending booking");
            booking
        };

        info!(payment_id = %payment.id, booking_id = %booking.id, "Payment marked paid");
        Ok(PaymentSuccess { payment, booking })
    }
}

/// Paid and refunded payments are final. A failed payment stays failed once
/// its booking is no longer active; for an active booking a late success
/// still settles it.
pub fn is_settled(payment: PaymentStatus, booking: BookingStatus) -> bool {
    match payment {
        PaymentStatus::Paid | PaymentStatus::Refunded => true,
        PaymentStatus::Failed => !booking.is_active(),
        PaymentStatus::Pending | PaymentStatus::Authorized => false,
    }
}

fn guard_payable(booking: &Booking) -> Result<(), AppError> {
    match booking.status {
        BookingStatus::Cancelled => Err(AppError::BadRequest("Cannot pay for a cancelled booking".into())),
        BookingStatus::Completed => Err(AppError::BadRequest("Cannot pay for a completed booking".into())),
        BookingStatus::Pending | BookingStatus::Confirmed => Ok(()),
    }
}

/// The renter pays; the venue owner or an admin may act on their behalf.
fn authorize_payer(identity: &Identity, booking: &Booking, venue: &Venue) -> Result<(), AppError> {
    if booking.renter_id == identity.user_id || venue.is_owned_by(&identity.user_id) || identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::BadRequest("Permission denied: you cannot pay for this booking".into()))
    }
}
