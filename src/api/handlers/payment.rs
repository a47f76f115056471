use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::responses::RefundResponse;
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.payment_service.create_payment_intent(&booking_id, &identity).await?))
}

pub async fn create_setup_intent(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.payment_service.create_setup_intent(&booking_id, &identity).await?))
}

pub async fn cancel_setup_intent(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.payment_service.cancel_setup_intent(&booking_id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn capture_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.payment_service.capture_payment(&booking_id, &identity).await?))
}

pub async fn process_refund(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let refund = state.payment_service.process_refund(&booking_id, &identity).await?;
    Ok(Json(RefundResponse { refund }))
}
