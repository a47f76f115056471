mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{days_ahead, ProviderCall, TestApp};
use court_booking_backend::domain::models::{auth::Role, venue::VenueAdminConfig};
use serde_json::json;

#[tokio::test]
async fn instant_booking_requires_immediate_payment() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "10:00", "11:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let (status, booking) = app.book(&renter, &venue.id, date, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_amount"], 50.0);
    assert_eq!(booking["requires_immediate_payment"], true);
    assert_eq!(booking["awaiting_owner_approval"], false);
    assert_eq!(booking["awaiting_insurance_approval"], false);

    let booking_id = booking["id"].as_str().unwrap();
    let (status, intent) = app.request("POST", &format!("/api/v1/bookings/{}/payment-intent", booking_id), Some(&renter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(intent["amount"], 50.0);
    assert!(intent["client_secret"].as_str().unwrap().ends_with("_secret"));
    assert!(intent.get("setup_intent_id").is_none());

    assert_eq!(app.provider.calls(), vec![ProviderCall::PaymentIntent { amount_minor: 5000, currency: "usd".into() }]);

    let payment = app.state.payment_repo.find_by_booking(booking_id).await.unwrap().unwrap();
    assert_eq!(payment.platform_fee, 5.0);
    assert_eq!(payment.venue_owner_amount, 45.0);
}

#[tokio::test]
async fn policy_violations_surface_their_reason() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let soon = days_ahead(1);
    let blackout = days_ahead(10);
    app.open_slot(&venue, soon, "10:00", "11:00").await;
    app.open_slot(&venue, blackout, "10:00", "11:00").await;

    let mut config = VenueAdminConfig::permissive(venue.id.clone());
    config.min_advance_lead_time_hours = 72;
    config.blackout_dates = vec![blackout];
    app.state.admin_config_repo.upsert(&config).await.unwrap();

    let renter = app.token("renter-1", Role::Renter);
    let (status, body) = app.book(&renter, &venue.id, soon, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lead time"), "{}", body);

    let (status, body) = app.book(&renter, &venue.id, blackout, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("blackout"), "{}", body);
}

#[tokio::test]
async fn dates_outside_the_booking_horizon_are_rejected() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let renter = app.token("renter-1", Role::Renter);

    let (status, _) = app.book(&renter, &venue.id, days_ahead(-1), "10:00", "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.book(&renter, &venue.id, days_ahead(120), "10:00", "11:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("90 days"));
}

#[tokio::test]
async fn double_booking_is_a_conflict() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "10:00", "12:00").await;

    let first = app.token("renter-1", Role::Renter);
    let second = app.token("renter-2", Role::Renter);
    let (status, _) = app.book(&first, &venue.id, date, "10:00", "12:00").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.book(&second, &venue.id, date, "10:00", "12:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_type"], "booking_overlap");

    let (status, body) = app.book(&second, &venue.id, date, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_type"], "slot_unavailable");
}

#[tokio::test]
async fn weekly_recurrence_creates_child_occurrences() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "18:00", "19:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let (status, booking) = app.request("POST", "/api/v1/bookings", Some(&renter), Some(json!({
        "venue_id": venue.id,
        "date": date,
        "start_time": "18:00",
        "end_time": "19:00",
        "recurring_type": "weekly",
        "recurring_end_date": date + Duration::days(14),
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["recurring_instances"], 2);

    let (status, children) = app.request("GET", &format!("/api/v1/bookings/{}/recurring", booking["id"].as_str().unwrap()), Some(&renter), None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<String> = children.as_array().unwrap().iter().map(|c| c["date"].as_str().unwrap().to_string()).collect();
    assert_eq!(dates, vec![(date + Duration::weeks(1)).to_string(), (date + Duration::weeks(2)).to_string()]);
}

#[tokio::test]
async fn recurring_dates_cannot_overlap_existing_bookings() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    let next_week = date + Duration::weeks(1);
    app.open_slot(&venue, date, "10:00", "11:00").await;
    app.open_slot(&venue, next_week, "09:00", "12:00").await;

    let other = app.token("renter-2", Role::Renter);
    let (status, _) = app.book(&other, &venue.id, next_week, "09:00", "12:00").await;
    assert_eq!(status, StatusCode::CREATED);

    let renter = app.token("renter-1", Role::Renter);
    let (status, body) = app.request("POST", "/api/v1/bookings", Some(&renter), Some(json!({
        "venue_id": venue.id,
        "date": date,
        "start_time": "10:00",
        "end_time": "11:00",
        "recurring_type": "weekly",
        "recurring_end_date": next_week,
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_type"], "booking_overlap");
    assert!(body["error"].as_str().unwrap().contains(&next_week.to_string()), "{}", body);

    let (_, mine) = app.request("GET", "/api/v1/bookings", Some(&renter), None).await;
    assert!(mine.as_array().unwrap().is_empty());

    // The first date on its own is still free.
    let (status, _) = app.book(&renter, &venue.id, date, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recurring_booking_without_end_date_uses_default_horizon() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "18:00", "19:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let (_, booking) = app.request("POST", "/api/v1/bookings", Some(&renter), Some(json!({
        "venue_id": venue.id, "date": date, "start_time": "18:00", "end_time": "19:00", "recurring_type": "weekly",
    }))).await;
    assert_eq!(booking["recurring_instances"], 12);
    assert_eq!(booking["recurring_end_date"], (date + Duration::days(90)).to_string());
}

#[tokio::test]
async fn insurance_must_be_approved_before_confirmation() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, true).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "10:00", "11:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let owner = app.token("owner-1", Role::VenueOwner);
    let (_, booking) = app.book(&renter, &venue.id, date, "10:00", "11:00").await;
    assert_eq!(booking["requires_immediate_payment"], false);
    assert_eq!(booking["awaiting_insurance_approval"], true);
    let id = booking["id"].as_str().unwrap();

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/insurance/approve", id), Some(&renter), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, approved) = app.request("POST", &format!("/api/v1/bookings/{}/insurance/approve", id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["insurance_approved"], true);

    let (status, confirmed) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancellation_respects_the_48_hour_window() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let tomorrow = days_ahead(1);
    let later = days_ahead(7);
    app.open_slot(&venue, tomorrow, "22:00", "23:30").await;
    app.open_slot(&venue, later, "10:00", "11:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let (_, near) = app.book(&renter, &venue.id, tomorrow, "22:00", "23:30").await;
    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", near["id"].as_str().unwrap()), Some(&renter), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("48 hours"));

    let (_, far) = app.book(&renter, &venue.id, later, "10:00", "11:00").await;
    let far_id = far["id"].as_str().unwrap();
    let (status, cancelled) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", far_id), Some(&renter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", far_id), Some(&renter), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The slot is free again.
    let other = app.token("renter-2", Role::Renter);
    let (status, _) = app.book(&other, &venue.id, later, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn bookings_are_private_to_their_parties() {
    let app = TestApp::new().await;
    let venue = app.seed_venue("owner-1", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&venue, date, "10:00", "11:00").await;

    let renter = app.token("renter-1", Role::Renter);
    let (_, booking) = app.book(&renter, &venue.id, date, "10:00", "11:00").await;
    let uri = format!("/api/v1/bookings/{}", booking["id"].as_str().unwrap());

    let (status, _) = app.request("GET", &uri, Some(&renter), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", &uri, Some(&app.token("owner-1", Role::VenueOwner)), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", &uri, Some(&app.token("root", Role::Admin)), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("GET", &uri, Some(&app.token("renter-2", Role::Renter)), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Permission denied"));

    let (status, _) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request("GET", &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_is_scoped_by_role_and_time_view() {
    let app = TestApp::new().await;
    let mine = app.seed_venue("owner-1", true, false).await;
    let theirs = app.seed_venue("owner-2", true, false).await;
    let date = days_ahead(7);
    app.open_slot(&mine, date, "10:00", "11:00").await;
    app.open_slot(&theirs, date, "10:00", "11:00").await;

    let renter_a = app.token("renter-a", Role::Renter);
    let renter_b = app.token("renter-b", Role::Renter);
    app.book(&renter_a, &mine.id, date, "10:00", "11:00").await;
    app.book(&renter_b, &theirs.id, date, "10:00", "11:00").await;

    let count = |body: &serde_json::Value| body.as_array().unwrap().len();

    let (_, body) = app.request("GET", "/api/v1/bookings", Some(&renter_a), None).await;
    assert_eq!(count(&body), 1);
    assert_eq!(body[0]["renter_id"], "renter-a");

    // A renter cannot widen their view to admin.
    let (_, body) = app.request("GET", "/api/v1/bookings?role_view=admin", Some(&renter_a), None).await;
    assert_eq!(count(&body), 1);

    let owner = app.token("owner-1", Role::VenueOwner);
    let (_, body) = app.request("GET", "/api/v1/bookings", Some(&owner), None).await;
    assert_eq!(count(&body), 1);
    assert_eq!(body[0]["venue_id"], mine.id);
    let (_, body) = app.request("GET", &format!("/api/v1/bookings?venue_id={}", theirs.id), Some(&owner), None).await;
    assert_eq!(count(&body), 0);

    let owner_without_venues = app.token("owner-3", Role::VenueOwner);
    let (_, body) = app.request("GET", "/api/v1/bookings", Some(&owner_without_venues), None).await;
    assert_eq!(count(&body), 0);

    let admin = app.token("root", Role::Admin);
    let (_, body) = app.request("GET", "/api/v1/bookings", Some(&admin), None).await;
    assert_eq!(count(&body), 2);
    let (_, body) = app.request("GET", "/api/v1/bookings?role_view=renter", Some(&admin), None).await;
    assert_eq!(count(&body), 0);

    let (_, body) = app.request("GET", "/api/v1/bookings?time_view=upcoming", Some(&admin), None).await;
    assert_eq!(count(&body), 2);
    let (_, body) = app.request("GET", "/api/v1/bookings?time_view=past", Some(&admin), None).await;
    assert_eq!(count(&body), 0);
    let (_, body) = app.request("GET", "/api/v1/bookings?status=confirmed", Some(&admin), None).await;
    assert_eq!(count(&body), 0);
}
