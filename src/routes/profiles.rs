//! Profile routes — create, fetch-or-default, partial update.
//!
//! Every endpoint resolves to a profile: a fetch that misses materializes a
//! default row and an update without a row creates one first, so clients
//! never see a 404 here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::ms_to_rfc3339;
use crate::services::profile::{self, NewProfile, ProfileError, ProfileUpdate, UserProfile};
use crate::state::AppState;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
pub struct CreateProfileBody {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub fitness_level: Option<String>,
    #[serde(default)]
    pub goals: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
pub struct UpdateProfileBody {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub fitness_level: Option<String>,
    pub goals: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub age: Option<i32>,
    pub fitness_level: String,
    pub goals: Vec<String>,
    pub created_at: String,
}

fn to_response(profile: UserProfile) -> ProfileResponse {
    ProfileResponse {
        id: profile.id,
        user_id: profile.user_id,
        name: profile.name,
        age: profile.age,
        fitness_level: profile.fitness_level,
        goals: profile.goals,
        created_at: ms_to_rfc3339(profile.created_at),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/profile` — create, or return the existing profile untouched.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<CreateProfileBody>,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let new = NewProfile {
        user_id: body.user_id,
        name: body.name,
        age: body.age,
        fitness_level: body
            .fitness_level
            .unwrap_or_else(|| profile::DEFAULT_FITNESS_LEVEL.to_string()),
        goals: body.goals.unwrap_or_default(),
    };

    let row = profile::create_profile(&state.pool, new)
        .await
        .map_err(profile_error_to_status)?;

    Ok(Json(to_response(row)))
}

/// `GET /api/profile/{user_id}` — fetch, materializing a default if absent.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let row = profile::get_or_create(&state.pool, &user_id)
        .await
        .map_err(profile_error_to_status)?;

    Ok(Json(to_response(row)))
}

/// `PUT /api/profile/{user_id}` — partial update on the get-or-create result.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let update = ProfileUpdate {
        name: body.name,
        age: body.age,
        fitness_level: body.fitness_level,
        goals: body.goals,
    };

    let row = profile::update_profile(&state.pool, &user_id, update)
        .await
        .map_err(profile_error_to_status)?;

    Ok(Json(to_response(row)))
}

fn profile_error_to_status(err: ProfileError) -> StatusCode {
    match err {
        ProfileError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "profiles_test.rs"]
mod tests;
