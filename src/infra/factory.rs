use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{AuditLogRepository, PaymentProvider};
use crate::domain::services::{
    audit::AuditLogger, availability::AvailabilityService, booking_service::BookingService,
    conflict::ConflictChecker, payment_service::PaymentService,
};
use crate::infra::payments::stripe_provider::StripePaymentProvider;
use crate::infra::repositories::{
    sqlite_admin_config_repo::SqliteAdminConfigRepo, sqlite_audit_repo::SqliteAuditRepo,
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_external_block_repo::SqliteExternalBlockRepo, sqlite_payment_repo::SqlitePaymentRepo,
    sqlite_slot_instance_repo::SqliteSlotInstanceRepo, sqlite_venue_repo::SqliteVenueRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_sqlite_migrations(&pool).await;

    let provider = Arc::new(StripePaymentProvider::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    ));

    build_state(config, pool, provider)
}

/// Wires repositories and services over an already migrated pool.
pub fn build_state(config: &Config, pool: SqlitePool, payment_provider: Arc<dyn PaymentProvider>) -> AppState {
    let audit_repo = Arc::new(SqliteAuditRepo::new(pool.clone()));
    build_state_with_audit(config, pool, payment_provider, audit_repo)
}

pub fn build_state_with_audit(
    config: &Config,
    pool: SqlitePool,
    payment_provider: Arc<dyn PaymentProvider>,
    audit_repo: Arc<dyn AuditLogRepository>,
) -> AppState {
    let venue_repo = Arc::new(SqliteVenueRepo::new(pool.clone()));
    let admin_config_repo = Arc::new(SqliteAdminConfigRepo::new(pool.clone()));
    let availability_repo = Arc::new(SqliteAvailabilityRepo::new(pool.clone()));
    let slot_repo = Arc::new(SqliteSlotInstanceRepo::new(pool.clone()));
    let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
    let payment_repo = Arc::new(SqlitePaymentRepo::new(pool.clone()));
    let block_repo = Arc::new(SqliteExternalBlockRepo::new(pool));

    let audit = Arc::new(AuditLogger::new(audit_repo.clone()));

    let availability_service = Arc::new(AvailabilityService::new(
        venue_repo.clone(),
        admin_config_repo.clone(),
        availability_repo.clone(),
        booking_repo.clone(),
        slot_repo.clone(),
        config.currency.clone(),
    ));

    let conflict_checker = Arc::new(ConflictChecker::new(
        venue_repo.clone(),
        booking_repo.clone(),
        slot_repo.clone(),
        block_repo.clone(),
    ));

    let payment_service = Arc::new(PaymentService::new(
        booking_repo.clone(),
        venue_repo.clone(),
        payment_repo.clone(),
        payment_provider.clone(),
        audit.clone(),
        config.currency.clone(),
        config.platform_fee_percent,
    ));

    let booking_service = Arc::new(BookingService::new(
        venue_repo.clone(),
        admin_config_repo.clone(),
        booking_repo.clone(),
        payment_repo.clone(),
        conflict_checker.clone(),
        payment_service.clone(),
        audit.clone(),
    ));

    AppState {
        config: config.clone(),
        venue_repo,
        admin_config_repo,
        availability_repo,
        slot_repo,
        booking_repo,
        payment_repo,
        block_repo,
        audit_repo,
        payment_provider,
        availability_service,
        conflict_checker,
        booking_service,
        payment_service,
        audit,
    }
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
