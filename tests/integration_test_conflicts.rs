mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::{days_ahead, TestApp};
use court_booking_backend::domain::models::{auth::Role, availability::ExternalAvailabilityBlock};
use serde_json::json;
use uuid::Uuid;

fn conflicts_uri(venue_id: &str, date: chrono::NaiveDate, start: &str, end: &str) -> String {
    format!("/api/v1/venues/{}/conflicts?date={}&start_time={}&end_time={}", venue_id, date, start, end)
}

#[tokio::test]
async fn intervals_without_a_slot_instance_are_unavailable() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(5);
    app.seed_availability(&venue.id, date, "10:00", "12:00").await;

    let (status, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "12:00"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_conflict"], true);
    assert_eq!(body["conflict_type"], "slot_unavailable");
}

#[tokio::test]
async fn generated_slot_passes_until_booked() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(5);
    app.open_slot(&venue, date, "10:00", "12:00").await;

    let (_, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "12:00"), None, None).await;
    assert_eq!(body["has_conflict"], false);
    assert!(body["conflict_type"].is_null());

    // Only the exact generated interval is bookable.
    let (_, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "11:00"), None, None).await;
    assert_eq!(body["conflict_type"], "slot_unavailable");

    let renter = app.token("renter-1", Role::Renter);
    let (status, booking) = app.book(&renter, &venue.id, date, "10:00", "12:00").await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "12:00"), None, None).await;
    assert_eq!(body["has_conflict"], true);
    assert_eq!(body["conflict_type"], "booking_overlap");

    let uri = format!("{}&exclude_booking_id={}", conflicts_uri(&venue.id, date, "10:00", "12:00"), booking["id"].as_str().unwrap());
    let (_, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(body["has_conflict"], false);
}

#[tokio::test]
async fn external_calendar_block_makes_slot_unavailable() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(5);
    app.open_slot(&venue, date, "10:00", "12:00").await;

    let start = Utc.from_utc_datetime(&date.and_hms_opt(11, 0, 0).unwrap());
    let block = ExternalAvailabilityBlock {
        id: Uuid::new_v4().to_string(),
        venue_id: venue.id.clone(),
        source: "google".into(),
        source_event_id: "evt-1".into(),
        start_at: start,
        end_at: start + chrono::Duration::hours(2),
        status: "busy".into(),
    };
    app.state.block_repo.create(&block).await.unwrap();

    let (_, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "12:00"), None, None).await;
    assert_eq!(body["has_conflict"], true);
    assert_eq!(body["conflict_type"], "slot_unavailable");

    let mut cancelled = block.clone();
    cancelled.status = "cancelled".into();
    app.state.block_repo.create(&cancelled).await.unwrap();

    let (_, body) = app.request("GET", &conflicts_uri(&venue.id, date, "10:00", "12:00"), None, None).await;
    assert_eq!(body["has_conflict"], false);
}

#[tokio::test]
async fn recurring_dates_respect_calendar_blocks() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(5);
    let next_week = date + chrono::Duration::weeks(1);
    app.open_slot(&venue, date, "10:00", "12:00").await;

    let start = Utc.from_utc_datetime(&next_week.and_hms_opt(11, 0, 0).unwrap());
    app.state.block_repo.create(&ExternalAvailabilityBlock {
        id: Uuid::new_v4().to_string(),
        venue_id: venue.id.clone(),
        source: "google".into(),
        source_event_id: "evt-weekly".into(),
        start_at: start,
        end_at: start + chrono::Duration::hours(1),
        status: "busy".into(),
    }).await.unwrap();

    let renter = app.token("renter-1", Role::Renter);
    let (status, body) = app.request("POST", "/api/v1/bookings", Some(&renter), Some(json!({
        "venue_id": venue.id,
        "date": date,
        "start_time": "10:00",
        "end_time": "12:00",
        "recurring_type": "weekly",
        "recurring_end_date": next_week,
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_type"], "slot_unavailable");
    assert!(body["error"].as_str().unwrap().contains(&next_week.to_string()), "{}", body);
}

#[tokio::test]
async fn inverted_interval_is_a_bad_request() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;

    let (status, _) = app.request("GET", &conflicts_uri(&venue.id, days_ahead(5), "12:00", "10:00"), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
