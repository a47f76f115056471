use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub renter_id: String,
    pub venue_id: String,
    pub amount: f64,
    pub platform_fee: f64,
    pub venue_owner_amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_setup_intent_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: String, renter_id: String, venue_id: String, amount: f64, fee_percent: f64, currency: String) -> Self {
        let platform_fee = round_cents(amount * fee_percent / 100.0);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            renter_id,
            venue_id,
            amount,
            platform_fee,
            venue_owner_amount: round_cents(amount - platform_fee),
            currency,
            status: PaymentStatus::Pending,
            stripe_payment_intent_id: None,
            stripe_setup_intent_id: None,
            paid_at: None,
            refunded_at: None,
            refund_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn amount_minor_units(&self) -> i64 {
        to_minor_units(self.amount)
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[derive(Debug, Serialize, Clone)]
pub struct IntentResponse {
    pub client_secret: String,
    pub payment_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_intent_id: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CaptureResult {
    pub payment_id: String,
    pub payment_intent_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Clone)]
pub struct RefundResult {
    pub refund_id: String,
    pub amount: f64,
    pub status: String,
}
