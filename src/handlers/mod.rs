pub mod auth;
pub mod bookings;
pub mod jobs;
pub mod pets;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/pets", get(pets::list).post(pets::create))
        .route(
            "/api/pets/:id",
            get(pets::get_one).put(pets::update).delete(pets::remove),
        )
        .route("/api/jobs", get(jobs::list).post(jobs::create))
        .route("/api/jobs/available", get(jobs::available))
        .route(
            "/api/jobs/:id",
            get(jobs::get_one).put(jobs::update).delete(jobs::remove),
        )
        .route(
            "/api/bookings",
            get(bookings::list).post(bookings::create),
        )
        .route("/api/bookings/occupied", get(bookings::occupied))
        .route("/api/bookings/:id/cancel", patch(bookings::cancel))
        .route("/api/bookings/:id/complete", patch(bookings::complete))
        .route("/api/bookings/:id/reopen", patch(bookings::reopen))
        .route(
            "/api/admin/bookings/:id/status",
            patch(bookings::override_status),
        )
        .with_state(state)
}
