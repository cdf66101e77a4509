use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::state::AppState;

use super::dto::{CreateProfileRequest, ProfileResponse, UpdateProfileRequest};
use super::repo::{self, UserProfile};
use super::services::is_valid_email;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).post(create_profile).put(update_profile))
        .route("/profile/sign-out", post(sign_out))
}

/// GET /profile: the active (first) profile. 404 means onboarding.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let profile = UserProfile::find_first(&state.db)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if let Ok(Some(_)) = UserProfile::find_first(&state.db).await {
        warn!("profile already exists");
        return Err((StatusCode::CONFLICT, "Profile already exists".into()));
    }

    let profile = UserProfile::create(
        &state.db,
        &payload.name,
        &payload.email,
        payload.daily_calorie_goal,
        &payload.dietary_restrictions,
        &payload.health_goals,
    )
    .await
    .map_err(internal)?;

    info!(profile_id = %profile.id, "profile created");
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let existing = UserProfile::find_first(&state.db)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;

    let profile = UserProfile::update(
        &state.db,
        existing.id,
        &payload.name,
        &payload.email,
        payload.daily_calorie_goal,
        &payload.dietary_restrictions,
        &payload.health_goals,
    )
    .await
    .map_err(internal)?;

    Ok(Json(profile.into()))
}

/// POST /profile/sign-out: wipes profiles, recipes and restaurants.
/// Store failures are logged and swallowed; the reset is best-effort.
#[instrument(skip(state))]
pub async fn sign_out(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = repo::sign_out_reset(&state.db).await {
        error!(error = %e, "sign-out reset failed; no effect");
    } else {
        info!("local store reset");
    }
    StatusCode::NO_CONTENT
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
