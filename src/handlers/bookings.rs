use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::bearer_actor;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::booking::{self, CreateBookingRequest};
use crate::services::lifecycle;
use crate::state::AppState;

// POST /api/bookings
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;

    // The lock spans the duplicate check and the insert.
    let db = state.db.lock().unwrap();
    let created = booking::create(&db, &actor, &body)?;
    Ok(Json(created))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

// GET /api/bookings
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();

    let bookings = if actor.is_admin() {
        let status = match query.status.as_deref() {
            Some(s) => Some(
                BookingStatus::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("unknown status: {s}")))?,
            ),
            None => None,
        };
        queries::get_all_bookings(&db, status, query.limit.unwrap_or(100))?
    } else {
        queries::get_bookings_for_user(&db, &actor.id)?
    };
    Ok(Json(bookings))
}

// PATCH /api/bookings/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();
    Ok(Json(lifecycle::cancel(&db, &actor, &id)?))
}

#[derive(Deserialize, Default)]
pub struct CompleteRequest {
    pub real_start: Option<String>,
    pub real_end: Option<String>,
}

// PATCH /api/bookings/:id/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<CompleteRequest>>,
) -> Result<Json<Booking>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let db = state.db.lock().unwrap();
    Ok(Json(lifecycle::complete(
        &db,
        &actor,
        &id,
        body.real_start.as_deref(),
        body.real_end.as_deref(),
    )?))
}

// PATCH /api/bookings/:id/reopen
pub async fn reopen(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();
    Ok(Json(lifecycle::reopen(&db, &actor, &id)?))
}

#[derive(Deserialize)]
pub struct OverrideRequest {
    pub status: String,
}

// PATCH /api/admin/bookings/:id/status
pub async fn override_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<OverrideRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();
    Ok(Json(lifecycle::override_status(&db, &actor, &id, &body.status)?))
}

#[derive(Deserialize)]
pub struct OccupiedQuery {
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct OccupiedSlotResponse {
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub job_id: String,
}

// GET /api/bookings/occupied?start=YYYY-MM-DD&end=YYYY-MM-DD
//
// Pure read for the slot picker; storage failures degrade to empty.
pub async fn occupied(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OccupiedQuery>,
) -> Result<Json<Vec<OccupiedSlotResponse>>, AppError> {
    let _actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();

    let slots = match booking::occupied_slots(&db, &query.start, &query.end) {
        Ok(slots) => slots,
        Err(e @ AppError::Validation(_)) => return Err(e),
        Err(e) => {
            tracing::warn!("occupied-slot listing failed, returning empty: {e}");
            vec![]
        }
    };

    Ok(Json(
        slots
            .into_iter()
            .map(|s| OccupiedSlotResponse {
                booking_date: s.booking_date,
                booking_time: s.booking_time,
                job_id: s.job_id,
            })
            .collect(),
    ))
}
