use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::state::AppState;

use super::dto::{CreateRestaurantRequest, FavoriteRequest};
use super::repo::Restaurant;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants).post(create_restaurant))
        .route("/restaurants/:id", delete(delete_restaurant))
        .route("/restaurants/:id/favorite", put(set_favorite))
}

#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Restaurant>>, (StatusCode, String)> {
    let restaurants = Restaurant::list(&state.db).await.map_err(internal)?;
    Ok(Json(restaurants))
}

#[instrument(skip(state, payload))]
pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> Result<(StatusCode, Json<Restaurant>), (StatusCode, String)> {
    let restaurant = Restaurant::create(
        &state.db,
        &payload.name,
        &payload.cuisine,
        payload.rating,
        payload.latitude,
        payload.longitude,
        &payload.address,
        &payload.dietary_options,
    )
    .await
    .map_err(internal)?;

    info!(restaurant_id = %restaurant.id, name = %restaurant.name, "restaurant added");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

#[instrument(skip(state))]
pub async fn set_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let updated = Restaurant::set_favorite(&state.db, id, payload.is_favorite)
        .await
        .map_err(internal)?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Restaurant not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = Restaurant::delete(&state.db, id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Restaurant not found".into()))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
