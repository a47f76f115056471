use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{ConflictQuery, GenerateSlotInstancesRequest, SlotRangeQuery};
use crate::api::dtos::responses::GeneratedSlotsResponse;
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<String>,
    Query(range): Query<SlotRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let slots = state.availability_service
        .get_available_slots(&venue_id, range.date_from, range.date_to)
        .await?;
    Ok(Json(slots))
}

pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<String>,
    Query(q): Query<ConflictQuery>,
) -> Result<impl IntoResponse, AppError> {
    let check = state.conflict_checker
        .check_conflicts(&venue_id, q.date, q.start_time, q.end_time, q.exclude_booking_id.as_deref())
        .await?;
    Ok(Json(check))
}

pub async fn generate_slot_instances(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(venue_id): Path<String>,
    Json(payload): Json<GenerateSlotInstancesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.availability_service
        .generate_slot_instances(&venue_id, payload.date_from, payload.date_to, &identity)
        .await?;
    info!(venue_id, created = created.len(), "Generated slot instances");
    Ok((StatusCode::CREATED, Json(GeneratedSlotsResponse { created: created.len(), slot_instances: created })))
}
