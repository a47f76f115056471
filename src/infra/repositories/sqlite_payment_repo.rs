use crate::domain::{models::payment::Payment, ports::PaymentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?").bind(booking_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE stripe_payment_intent_id = ?").bind(payment_intent_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn upsert(&self, payment: &Payment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, booking_id, renter_id, venue_id, amount, platform_fee, venue_owner_amount, currency, status, stripe_payment_intent_id, stripe_setup_intent_id, paid_at, refunded_at, refund_amount, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(booking_id) DO UPDATE SET
                amount = excluded.amount,
                platform_fee = excluded.platform_fee,
                venue_owner_amount = excluded.venue_owner_amount,
                currency = excluded.currency,
                status = excluded.status,
                stripe_payment_intent_id = excluded.stripe_payment_intent_id,
                stripe_setup_intent_id = excluded.stripe_setup_intent_id,
                paid_at = excluded.paid_at,
                refunded_at = excluded.refunded_at,
                refund_amount = excluded.refund_amount,
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&payment.id).bind(&payment.booking_id).bind(&payment.renter_id).bind(&payment.venue_id)
            .bind(payment.amount).bind(payment.platform_fee).bind(payment.venue_owner_amount).bind(&payment.currency)
            .bind(payment.status).bind(&payment.stripe_payment_intent_id).bind(&payment.stripe_setup_intent_id)
            .bind(payment.paid_at).bind(payment.refunded_at).bind(payment.refund_amount)
            .bind(payment.created_at).bind(Utc::now())
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
