use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::{CreateBookingRequest, ListBookingsParams};
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.booking_service.create_booking(payload.into(), &identity).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<ListBookingsParams>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service.list_bookings(params.into(), &identity).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.get_booking(&booking_id, &identity).await?))
}

pub async fn list_recurring_instances(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_recurring_instances(&booking_id, &identity).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.cancel_booking(&booking_id, &identity).await?))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.confirm_booking(&booking_id, &identity).await?))
}

pub async fn approve_insurance(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.approve_insurance(&booking_id, &identity).await?))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.booking_service.delete_unpaid_booking(&booking_id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
