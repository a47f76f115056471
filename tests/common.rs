use court_booking_backend::{
    api::router::create_router,
    config::Config,
    domain::models::{
        auth::{Claims, Role},
        availability::Availability,
        venue::Venue,
    },
    domain::ports::{
        AuditLogRepository, CheckoutSession, PaymentMetadata, PaymentProvider, ProviderIntent,
        ProviderRefund, SavedPaymentMethod,
    },
    error::AppError,
    infra::factory::{build_state_with_audit, run_sqlite_migrations},
    infra::repositories::sqlite_audit_repo::SqliteAuditRepo,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    PaymentIntent { amount_minor: i64, currency: String },
    SetupIntent,
    RetrieveSetupIntent(String),
    Charge { amount_minor: i64 },
    CancelSetupIntent(String),
    Refund { payment_intent_id: String, amount_minor: i64 },
    CheckoutSession(String),
}

/// In-memory stand-in for Stripe. Records every call it receives.
#[derive(Default)]
pub struct MockPaymentProvider {
    pub calls: Mutex<Vec<ProviderCall>>,
    pub decline_charges: AtomicBool,
    counter: AtomicUsize,
}

impl MockPaymentProvider {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}_mock_{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst))
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(&self, amount_minor: i64, currency: &str, _metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError> {
        self.record(ProviderCall::PaymentIntent { amount_minor, currency: currency.to_string() });
        let id = self.next_id("pi");
        Ok(ProviderIntent { client_secret: Some(format!("{}_secret", id)), id, status: "requires_payment_method".into() })
    }

    async fn create_setup_intent(&self, _metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError> {
        self.record(ProviderCall::SetupIntent);
        let id = self.next_id("seti");
        Ok(ProviderIntent { client_secret: Some(format!("{}_secret", id)), id, status: "requires_payment_method".into() })
    }

    async fn retrieve_setup_intent(&self, setup_intent_id: &str) -> Result<Option<SavedPaymentMethod>, AppError> {
        self.record(ProviderCall::RetrieveSetupIntent(setup_intent_id.to_string()));
        Ok(Some(SavedPaymentMethod { payment_method_id: "pm_card_visa".into(), customer_id: Some("cus_mock".into()) }))
    }

    async fn charge_off_session(
        &self,
        amount_minor: i64,
        _currency: &str,
        _method: &SavedPaymentMethod,
        _metadata: &PaymentMetadata,
    ) -> Result<ProviderIntent, AppError> {
        self.record(ProviderCall::Charge { amount_minor });
        if self.decline_charges.load(Ordering::SeqCst) {
            return Err(AppError::Provider("Your card was declined. (card_declined)".into()));
        }
        Ok(ProviderIntent { id: self.next_id("pi"), client_secret: None, status: "succeeded".into() })
    }

    async fn cancel_setup_intent(&self, setup_intent_id: &str) -> Result<(), AppError> {
        self.record(ProviderCall::CancelSetupIntent(setup_intent_id.to_string()));
        Ok(())
    }

    async fn refund(&self, payment_intent_id: &str, amount_minor: i64) -> Result<ProviderRefund, AppError> {
        self.record(ProviderCall::Refund { payment_intent_id: payment_intent_id.to_string(), amount_minor });
        Ok(ProviderRefund { id: self.next_id("re"), amount_minor, status: "succeeded".into() })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        self.record(ProviderCall::CheckoutSession(session_id.to_string()));
        Ok(CheckoutSession::default())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub provider: Arc<MockPaymentProvider>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_webhook_secret(None).await
    }

    pub async fn with_webhook_secret(webhook_secret: Option<&str>) -> Self {
        Self::build(webhook_secret, |pool| -> Arc<dyn AuditLogRepository> { Arc::new(SqliteAuditRepo::new(pool)) }).await
    }

    /// Swaps in a custom audit repository built over the test pool.
    pub async fn with_audit_repo<F>(make_audit_repo: F) -> Self
    where
        F: FnOnce(Pool<Sqlite>) -> Arc<dyn AuditLogRepository>,
    {
        Self::build(None, make_audit_repo).await
    }

    async fn build<F>(webhook_secret: Option<&str>, make_audit_repo: F) -> Self
    where
        F: FnOnce(Pool<Sqlite>) -> Arc<dyn AuditLogRepository>,
    {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await;

        let config = Config {
            database_url: db_url,
            port: 0,
            jwt_secret: JWT_SECRET.to_string(),
            stripe_secret_key: "sk_test_mock".to_string(),
            stripe_api_base: "http://localhost".to_string(),
            stripe_webhook_secret: webhook_secret.map(str::to_string),
            currency: "usd".to_string(),
            platform_fee_percent: 10.0,
        };

        let provider = Arc::new(MockPaymentProvider::default());
        let audit_repo = make_audit_repo(pool.clone());
        let state = Arc::new(build_state_with_audit(&config, pool.clone(), provider.clone(), audit_repo));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            provider,
        }
    }

    pub fn token(&self, user_id: &str, role: Role) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn seed_venue(&self, owner_id: &str, instant_booking: bool, insurance_required: bool) -> Venue {
        let venue = Venue {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: "Downtown Court".to_string(),
            hourly_rate: 50.0,
            instant_booking,
            insurance_required,
            max_advance_booking_days: 90,
            timezone: "UTC".to_string(),
            created_at: Utc::now(),
        };
        self.state.venue_repo.create(&venue).await.unwrap()
    }

    pub async fn seed_availability(&self, venue_id: &str, date: NaiveDate, start: &str, end: &str) -> Availability {
        let availability = Availability::new(venue_id.to_string(), date, time(start), time(end));
        self.state.availability_repo.create(&availability).await.unwrap()
    }

    /// Opens a window and materializes its slot instance as the venue owner.
    pub async fn open_slot(&self, venue: &Venue, date: NaiveDate, start: &str, end: &str) {
        self.seed_availability(&venue.id, date, start, end).await;
        let owner = self.token(&venue.owner_id, Role::VenueOwner);
        let (status, _) = self.request(
            "POST",
            &format!("/api/v1/venues/{}/slot-instances/generate", venue.id),
            Some(&owner),
            Some(json!({ "date_from": date, "date_to": date })),
        ).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    pub async fn book(&self, renter_token: &str, venue_id: &str, date: NaiveDate, start: &str, end: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/v1/bookings",
            Some(renter_token),
            Some(json!({ "venue_id": venue_id, "date": date, "start_time": start, "end_time": end })),
        ).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

#[allow(dead_code)]
pub fn days_ahead(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}
