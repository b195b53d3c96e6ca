use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if !body.email.contains('@') {
        return Err(AppError::validation("invalid email"));
    }
    if body.password.len() < 6 {
        return Err(AppError::validation(
            "password must be at least 6 characters",
        ));
    }

    let password_hash = auth::hash_password(&body.password)?;
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        password_hash,
        role: Role::Customer,
        phone: body.phone,
        created_at: Utc::now().naive_utc(),
    };

    let token = {
        let db = state.db.lock().unwrap();
        if queries::get_user_by_email(&db, &user.email)?.is_some() {
            return Err(AppError::Conflict("email already registered".to_string()));
        }
        queries::create_user(&db, &user)?;
        state.auth.issue_token(&user)?
    };

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = {
        let db = state.db.lock().unwrap();
        queries::get_user_by_email(&db, &body.email.trim().to_lowercase())?
    };

    let user = user.filter(|u| auth::verify_password(&body.password, &u.password_hash));
    let user = user.ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    let token = state.auth.issue_token(&user)?;
    Ok(Json(AuthResponse { token, user }))
}
