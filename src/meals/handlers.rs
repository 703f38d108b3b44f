use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    positive_grams, required_name, AnalyzeMealRequest, CleanupResponse, GlycemicRequest, GradeRequest,
    InvalidateCacheRequest,
};
use crate::cache::CacheStats;
use crate::glycemic::GiResult;
use crate::grading::{grade, GradingResult};
use crate::nutrition::{FoodDescriptor, ResolutionResult};
use crate::pipeline::{AnalyzedItem, MealAnalysis};
use crate::state::AppState;

/// Upper bound on items per meal request.
const MAX_MEAL_ITEMS: usize = 50;

pub fn nutrition_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/resolve", post(resolve_food))
        .route("/nutrition/analyze", post(analyze_food))
        .route("/nutrition/glycemic", post(glycemic))
        .route("/nutrition/grade", post(grade_nutrition))
        .route("/meals/analyze", post(analyze_meal))
}

pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/cache", delete(invalidate_cache))
        .route("/nutrition/cache/cleanup", post(cleanup_cache))
        .route("/nutrition/cache/stats", get(cache_stats))
}

fn bad_request(msg: String) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg)
}

#[instrument(skip(state))]
pub async fn resolve_food(
    State(state): State<AppState>,
    Json(body): Json<FoodDescriptor>,
) -> Result<Json<ResolutionResult>, (StatusCode, String)> {
    body.validate().map_err(bad_request)?;
    Ok(Json(state.pipeline.resolver().resolve(&body).await))
}

#[instrument(skip(state))]
pub async fn analyze_food(
    State(state): State<AppState>,
    Json(body): Json<FoodDescriptor>,
) -> Result<Json<AnalyzedItem>, (StatusCode, String)> {
    body.validate().map_err(bad_request)?;
    Ok(Json(state.pipeline.analyze_item(&body).await))
}

#[instrument(skip(state, body), fields(items = body.items.len()))]
pub async fn analyze_meal(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeMealRequest>,
) -> Result<Json<MealAnalysis>, (StatusCode, String)> {
    if body.items.is_empty() {
        return Err(bad_request("items must not be empty".into()));
    }
    if body.items.len() > MAX_MEAL_ITEMS {
        return Err(bad_request(format!("at most {MAX_MEAL_ITEMS} items per meal")));
    }
    for item in &body.items {
        item.validate().map_err(bad_request)?;
    }
    let analysis = state.pipeline.analyze_meal(&body.items).await;
    info!(id = %analysis.id, "meal analysis ready");
    Ok(Json(analysis))
}

#[instrument(skip(state))]
pub async fn glycemic(
    State(state): State<AppState>,
    Json(body): Json<GlycemicRequest>,
) -> Result<Json<GiResult>, (StatusCode, String)> {
    required_name(&body.name).map_err(bad_request)?;
    positive_grams(body.serving_grams).map_err(bad_request)?;
    Ok(Json(
        state
            .pipeline
            .glycemic()
            .lookup(&body.name, &body.nutrition, body.serving_grams),
    ))
}

#[instrument]
pub async fn grade_nutrition(
    Json(body): Json<GradeRequest>,
) -> Result<Json<GradingResult>, (StatusCode, String)> {
    positive_grams(body.serving_grams).map_err(bad_request)?;
    Ok(Json(grade(
        &body.nutrition,
        body.serving_grams,
        body.food_group.as_deref(),
        body.is_beverage,
        body.gi.as_ref(),
    )))
}

#[instrument(skip(state))]
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(body): Json<InvalidateCacheRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    required_name(&body.name).map_err(bad_request)?;
    positive_grams(body.serving_grams).map_err(bad_request)?;
    let removed = state.cache.invalidate(&body.name, body.serving_grams).await;
    info!(name = %body.name, removed, "cache entry invalidated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn cleanup_cache(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, (StatusCode, String)> {
    let removed = state.cache.cleanup_expired().await;
    Ok(Json(CleanupResponse { removed }))
}

#[instrument(skip(state))]
pub async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStats>, (StatusCode, String)> {
    state
        .cache
        .stats()
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::SERVICE_UNAVAILABLE, "cache stats unavailable".into()))
}
