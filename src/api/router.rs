use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{booking, health, payment, slots, webhook};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Venue inventory
        .route("/api/v1/venues/{venue_id}/slots", get(slots::get_available_slots))
        .route("/api/v1/venues/{venue_id}/conflicts", get(slots::check_conflicts))
        .route("/api/v1/venues/{venue_id}/slot-instances/generate", post(slots::generate_slot_instances))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking).delete(booking::delete_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/confirm", post(booking::confirm_booking))
        .route("/api/v1/bookings/{booking_id}/insurance/approve", post(booking::approve_insurance))
        .route("/api/v1/bookings/{booking_id}/recurring", get(booking::list_recurring_instances))

        // Payments
        .route("/api/v1/bookings/{booking_id}/payment-intent", post(payment::create_payment_intent))
        .route("/api/v1/bookings/{booking_id}/setup-intent", post(payment::create_setup_intent))
        .route("/api/v1/bookings/{booking_id}/setup-intent/cancel", post(payment::cancel_setup_intent))
        .route("/api/v1/bookings/{booking_id}/capture", post(payment::capture_payment))
        .route("/api/v1/bookings/{booking_id}/refund", post(payment::process_refund))

        .route("/api/v1/webhooks/stripe", post(webhook::stripe_webhook))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
