use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::bearer_actor;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Pet, PetSize};
use crate::services::policy::{self, Action};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PetRequest {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub size: Option<String>,
    /// Admins may register a pet for another user.
    pub owner_id: Option<String>,
}

// GET /api/pets
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Pet>>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();

    let pets = if actor.is_admin() {
        queries::get_all_pets(&db)?
    } else {
        queries::get_pets_for_owner(&db, &actor.id)?
    };
    Ok(Json(pets))
}

// POST /api/pets
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PetRequest>,
) -> Result<Json<Pet>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;

    if body.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if body.species.trim().is_empty() {
        return Err(AppError::validation("species is required"));
    }

    let owner_id = match body.owner_id {
        Some(owner) if actor.is_admin() => owner,
        Some(_) => return Err(AppError::Forbidden("only an admin may set owner_id".to_string())),
        None => actor.id.clone(),
    };

    let pet = Pet {
        id: Uuid::new_v4().to_string(),
        owner_id,
        name: body.name.trim().to_string(),
        species: body.species.trim().to_string(),
        breed: body.breed,
        age: body.age,
        weight: body.weight,
        size: PetSize::parse(body.size.as_deref().unwrap_or("M")),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_pet(&db, &pet)?;
    }
    Ok(Json(pet))
}

// GET /api/pets/:id
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Pet>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();

    let pet =
        queries::get_pet_by_id(&db, &id)?.ok_or_else(|| AppError::not_found("pet not found"))?;
    policy::authorize(&actor, Action::ManagePet, Some(&pet.owner_id))?;
    Ok(Json(pet))
}

// PUT /api/pets/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PetRequest>,
) -> Result<Json<Pet>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;

    if body.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if body.species.trim().is_empty() {
        return Err(AppError::validation("species is required"));
    }

    let db = state.db.lock().unwrap();
    let mut pet =
        queries::get_pet_by_id(&db, &id)?.ok_or_else(|| AppError::not_found("pet not found"))?;
    policy::authorize(&actor, Action::ManagePet, Some(&pet.owner_id))?;

    pet.name = body.name.trim().to_string();
    pet.species = body.species.trim().to_string();
    pet.breed = body.breed;
    pet.age = body.age;
    pet.weight = body.weight;
    if let Some(size) = body.size.as_deref() {
        pet.size = PetSize::parse(size);
    }

    queries::update_pet(&db, &pet)?;
    Ok(Json(pet))
}

// DELETE /api/pets/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = bearer_actor(&headers, &state.auth)?;
    let db = state.db.lock().unwrap();

    let pet =
        queries::get_pet_by_id(&db, &id)?.ok_or_else(|| AppError::not_found("pet not found"))?;
    policy::authorize(&actor, Action::ManagePet, Some(&pet.owner_id))?;

    queries::delete_pet(&db, &id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
