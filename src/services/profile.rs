//! User profile service — create, read, and partial update.
//!
//! DESIGN
//! ======
//! Profiles are keyed by user identity, one row each. Reads that miss
//! materialize a default profile so the coach always has something to work
//! with; creates are first-write-wins (`ON CONFLICT DO NOTHING`) so a
//! duplicate create returns the existing profile untouched.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::events::now_ms;

pub const DEFAULT_NAME: &str = "user";
pub const DEFAULT_FITNESS_LEVEL: &str = "beginner";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row returned from profile queries.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub age: Option<i32>,
    /// One of `beginner`, `intermediate`, `advanced`. Free-form on purpose —
    /// the coach prompt quotes it verbatim.
    pub fitness_level: String,
    pub goals: Vec<String>,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}

/// Payload for an explicit profile create.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: String,
    pub name: String,
    pub age: Option<i32>,
    pub fitness_level: String,
    pub goals: Vec<String>,
}

/// Partial update: absent fields keep their current values.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub fitness_level: Option<String>,
    pub goals: Option<Vec<String>>,
}

fn default_profile(user_id: &str) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        name: DEFAULT_NAME.to_string(),
        age: None,
        fitness_level: DEFAULT_FITNESS_LEVEL.to_string(),
        goals: Vec::new(),
        created_at: now_ms(),
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

type ProfileRow = (Uuid, String, String, Option<i32>, String, Json<Vec<String>>, i64);

fn from_row((id, user_id, name, age, fitness_level, goals, created_at): ProfileRow) -> UserProfile {
    UserProfile { id, user_id, name, age, fitness_level, goals: goals.0, created_at }
}

/// Look up a profile without creating one.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn fetch(pool: &PgPool, user_id: &str) -> Result<Option<UserProfile>, ProfileError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, user_id, name, age, fitness_level, goals, created_at
         FROM user_profiles
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

/// Create a profile, or return the existing one if the user already has it.
///
/// # Errors
///
/// Returns a database error if the insert or lookup fails.
pub async fn create_profile(pool: &PgPool, new: NewProfile) -> Result<UserProfile, ProfileError> {
    let profile = UserProfile {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        name: new.name,
        age: new.age,
        fitness_level: new.fitness_level,
        goals: new.goals,
        created_at: now_ms(),
    };

    let result = sqlx::query(
        "INSERT INTO user_profiles (id, user_id, name, age, fitness_level, goals, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(profile.id)
    .bind(&profile.user_id)
    .bind(&profile.name)
    .bind(profile.age)
    .bind(&profile.fitness_level)
    .bind(Json(&profile.goals))
    .bind(profile.created_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Lost the race or the profile predates this call: return what's there.
        if let Some(existing) = fetch(pool, &profile.user_id).await? {
            return Ok(existing);
        }
    }

    Ok(profile)
}

/// Fetch the user's profile, materializing a default one on first access.
///
/// # Errors
///
/// Returns a database error if the lookup or default insert fails.
pub async fn get_or_create(pool: &PgPool, user_id: &str) -> Result<UserProfile, ProfileError> {
    if let Some(existing) = fetch(pool, user_id).await? {
        return Ok(existing);
    }
    let default = default_profile(user_id);
    create_profile(
        pool,
        NewProfile {
            user_id: default.user_id,
            name: default.name,
            age: default.age,
            fitness_level: default.fitness_level,
            goals: default.goals,
        },
    )
    .await
}

/// Apply a partial update, materializing a default profile first if the
/// user has none. Returns the profile after the update.
///
/// # Errors
///
/// Returns a database error if any statement fails.
pub async fn update_profile(
    pool: &PgPool,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<UserProfile, ProfileError> {
    if let Some(updated) = apply_update(pool, user_id, &update).await? {
        return Ok(updated);
    }

    // No row yet. Seed the default (first-write-wins), then apply again.
    get_or_create(pool, user_id).await?;
    match apply_update(pool, user_id, &update).await? {
        Some(updated) => Ok(updated),
        None => Err(ProfileError::Database(sqlx::Error::RowNotFound)),
    }
}

/// Single-statement merge: absent fields keep their stored values via
/// COALESCE, so concurrent updates with disjoint fields both land.
async fn apply_update(
    pool: &PgPool,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<Option<UserProfile>, ProfileError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "UPDATE user_profiles
         SET name = COALESCE($2, name),
             age = COALESCE($3, age),
             fitness_level = COALESCE($4, fitness_level),
             goals = COALESCE($5, goals)
         WHERE user_id = $1
         RETURNING id, user_id, name, age, fitness_level, goals, created_at",
    )
    .bind(user_id)
    .bind(update.name.as_deref())
    .bind(update.age)
    .bind(update.fitness_level.as_deref())
    .bind(update.goals.as_ref().map(Json))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
