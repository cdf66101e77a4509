use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::edamam::client::SearchError;
use crate::edamam::diet;
use crate::edamam::query::{MealType, SearchCriteria};
use crate::state::AppState;

use super::dto::{
    DetailQuery, FilterOptions, LookupQuery, RecipeDetails, RecipeSummary, SavedFlagRequest,
    SavedFlagResponse, SavedQuery, SearchResults,
};
use super::services;
use super::tracker::SearchStatus;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/search/status", get(search_status))
        .route("/recipes/filters", get(filter_options))
        .route("/recipes/saved", get(list_saved))
        .route("/recipes/detail", get(recipe_detail))
        .route("/recipes/lookup", get(lookup_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/search", post(search))
        .route("/recipes/save", post(save_recipe))
        .route("/recipes/remove", post(remove_recipe))
}

fn search_error_response(e: SearchError) -> (StatusCode, String) {
    let status = match e {
        SearchError::NoMatches => StatusCode::NOT_FOUND,
        SearchError::InvalidRequest => StatusCode::INTERNAL_SERVER_ERROR,
        SearchError::TransportFailure | SearchError::EmptyResponse | SearchError::DecodeFailure => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, e.to_string())
}

/// POST /recipes/search: the create-meal pipeline. Fetch, reconcile,
/// filter by the calorie bound, rank.
#[instrument(skip(state, criteria))]
pub async fn search(
    State(state): State<AppState>,
    Json(criteria): Json<SearchCriteria>,
) -> Result<Json<SearchResults>, (StatusCode, String)> {
    let outcome = services::run_search(
        state.recipe_api.as_ref(),
        state.store.as_ref(),
        &state.search,
        &criteria,
        services::SearchMode::Create,
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "recipe search failed");
        search_error_response(e)
    })?;

    Ok(Json(SearchResults {
        generation: outcome.generation,
        results: outcome.recipes.iter().map(RecipeSummary::from).collect(),
        message: outcome.message,
    }))
}

/// GET /recipes/search/status: advisory loading snapshot for observers.
#[instrument(skip(state))]
pub async fn search_status(State(state): State<AppState>) -> Json<SearchStatus> {
    Json(state.search.snapshot())
}

/// GET /recipes/filters: the fixed meal-type and restriction choices.
pub async fn filter_options() -> Json<FilterOptions> {
    Json(FilterOptions {
        meal_types: MealType::ALL.iter().map(|m| m.label()).collect(),
        dietary_restrictions: diet::AVAILABLE_RESTRICTIONS.to_vec(),
    })
}

/// GET /recipes/lookup?query=: fetch the closest match and return it
/// reconciled (saved-aware pathway).
#[instrument(skip(state))]
pub async fn lookup_recipe(
    State(state): State<AppState>,
    Query(q): Query<LookupQuery>,
) -> Result<Json<RecipeSummary>, (StatusCode, String)> {
    let criteria = SearchCriteria {
        query: q.query,
        ..Default::default()
    };
    let outcome = services::run_search(
        state.recipe_api.as_ref(),
        state.store.as_ref(),
        &state.search,
        &criteria,
        services::SearchMode::Browse,
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "recipe lookup failed");
        search_error_response(e)
    })?;

    let first = outcome
        .recipes
        .first()
        .ok_or((StatusCode::NOT_FOUND, "No recipes found".to_string()))?;
    Ok(Json(RecipeSummary::from(first)))
}

/// GET /recipes/saved?query=&category=: the persisted saved subset with
/// text and meal-type filters.
#[instrument(skip(state))]
pub async fn list_saved(
    State(state): State<AppState>,
    Query(q): Query<SavedQuery>,
) -> Json<Vec<RecipeSummary>> {
    let saved = match state.store.list_saved().await {
        Ok(saved) => saved,
        Err(e) => {
            error!(error = %e, "listing saved recipes failed");
            Vec::new()
        }
    };
    let filtered = services::filter_saved(saved, q.query.as_deref(), q.category.as_deref());
    Json(filtered.iter().map(RecipeSummary::from).collect())
}

/// GET /recipes/detail?uri=: the full stored record graph.
#[instrument(skip(state))]
pub async fn recipe_detail(
    State(state): State<AppState>,
    Query(q): Query<DetailQuery>,
) -> Result<Json<RecipeDetails>, (StatusCode, String)> {
    let recipe = state
        .store
        .find_by_uri(&q.uri)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".to_string()))?;

    let ingredients = state.store.ingredients_for(&q.uri).await.map_err(internal)?;
    let nutrients = state.store.nutrients_for(&q.uri).await.map_err(internal)?;

    Ok(Json(RecipeDetails {
        recipe,
        ingredients,
        nutrients,
    }))
}

/// POST /recipes/save: mark a stored recipe as saved. Store failures are
/// logged and reported as no effect, never as an error.
#[instrument(skip(state))]
pub async fn save_recipe(
    State(state): State<AppState>,
    Json(body): Json<SavedFlagRequest>,
) -> Json<SavedFlagResponse> {
    Json(apply_saved_flag(&state, body.uri, true).await)
}

/// POST /recipes/remove: clear the saved flag.
#[instrument(skip(state))]
pub async fn remove_recipe(
    State(state): State<AppState>,
    Json(body): Json<SavedFlagRequest>,
) -> Json<SavedFlagResponse> {
    Json(apply_saved_flag(&state, body.uri, false).await)
}

async fn apply_saved_flag(state: &AppState, uri: String, saved: bool) -> SavedFlagResponse {
    let applied = match state.store.set_saved(&uri, saved).await {
        Ok(applied) => applied,
        Err(e) => {
            error!(error = %e, uri = %uri, saved, "saved-flag update failed; no effect");
            false
        }
    };
    SavedFlagResponse {
        uri,
        is_saved: saved,
        applied,
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
