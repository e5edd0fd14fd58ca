use super::*;

use crate::state::test_helpers::test_app_state;

fn sample_row() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        user_id: "alice".into(),
        name: "Alice".into(),
        age: Some(28),
        fitness_level: "advanced".into(),
        goals: vec!["deadlift 2x bodyweight".into()],
        created_at: 1_700_000_000_000,
    }
}

#[test]
fn profile_error_maps_to_500() {
    let err = ProfileError::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(profile_error_to_status(err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn profile_created_at_renders_as_rfc3339() {
    let body = to_response(sample_row());

    assert_eq!(body.created_at, "2023-11-14T22:13:20Z");
    assert_eq!(body.name, "Alice");
    assert_eq!(body.goals, vec!["deadlift 2x bodyweight".to_string()]);
}

#[test]
fn create_body_defaults_are_optional_in_json() {
    let body: CreateProfileBody =
        serde_json::from_str(r#"{"user_id": "bob", "name": "Bob"}"#).unwrap();

    assert_eq!(body.user_id, "bob");
    assert!(body.age.is_none());
    assert!(body.fitness_level.is_none());
    assert!(body.goals.is_none());
}

#[test]
fn update_body_accepts_partial_json() {
    let body: UpdateProfileBody = serde_json::from_str(r#"{"age": 40}"#).unwrap();

    assert_eq!(body.age, Some(40));
    assert!(body.name.is_none());
    assert!(body.goals.is_none());
}

#[tokio::test]
async fn get_profile_surfaces_database_failures_as_500() {
    // Dead test pool: get-or-create cannot reach Postgres.
    let state = test_app_state();

    let result = get_profile(State(state), Path("alice".into())).await;

    assert_eq!(result.err(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}
