mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::nutrition_routes())
        .merge(handlers::cache_routes())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::nutrition::{FoodType, NutritionRecord, NutritionSource};
    use crate::state::AppState;

    async fn call(state: AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = build_app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = call(AppState::fake(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn resolve_serves_cached_entry() {
        let state = AppState::fake();
        let apple = NutritionRecord {
            calories: 95.0,
            carbs: 25.0,
            ..Default::default()
        };
        assert!(
            state
                .cache
                .set("apple", &apple, NutritionSource::Usda, 0.95, 182.0, Some(FoodType::WholeFood))
                .await
        );

        let (status, body) = call(
            state,
            Method::POST,
            "/api/v1/nutrition/resolve",
            Some(json!({"name": "Apple", "estimated_grams": 182, "food_type": "whole_food"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert_eq!(v["source"], "cache");
        assert_eq!(v["nutrition"]["calories"], 95.0);
        assert_eq!(v["confidence"], 0.95);
    }

    #[tokio::test]
    async fn resolve_without_sources_is_unresolved() {
        let (status, body) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/nutrition/resolve",
            Some(json!({"name": "dragonfruit", "estimated_grams": 120})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert_eq!(v["source"], "none");
        assert_eq!(v["confidence"], 0.0);
        assert_eq!(v["serving_grams"], 120.0);
    }

    #[tokio::test]
    async fn non_positive_grams_are_rejected() {
        let (status, _) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/nutrition/resolve",
            Some(json!({"name": "apple", "estimated_grams": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/nutrition/grade",
            Some(json!({"nutrition": {"calories": 100}, "serving_grams": -5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_meal_is_rejected() {
        let (status, body) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/meals/analyze",
            Some(json!({"items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"items must not be empty");
    }

    #[tokio::test]
    async fn meal_analysis_reports_every_item() {
        let (status, body) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/meals/analyze",
            Some(json!({"items": [
                {"name": "toast", "estimated_grams": 30},
                {"name": "coffee", "estimated_grams": 240, "is_beverage": true}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert_eq!(v["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["total_grams"], 270.0);
        assert_eq!(v["items"][1]["nutrition_source"], "none");
    }

    #[tokio::test]
    async fn glycemic_lookup_matches_reference_food() {
        let (status, body) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/nutrition/glycemic",
            Some(json!({
                "name": "white rice",
                "nutrition": {"calories": 205, "carbs": 45, "fiber": 0.6},
                "serving_grams": 158
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert_eq!(v["glycemic_index"], 73.0);
        assert_eq!(v["match_type"], "exact");
        assert_eq!(v["relevant"], true);
    }

    #[tokio::test]
    async fn grade_returns_all_focuses() {
        let (status, body) = call(
            AppState::fake(),
            Method::POST,
            "/api/v1/nutrition/grade",
            Some(json!({
                "nutrition": {"calories": 165, "protein": 31, "fat": 3.6, "saturated_fat": 1, "sodium": 74},
                "serving_grams": 100
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert_eq!(v["focuses"].as_array().map(Vec::len), Some(10));
        assert!(v["gi_adjustment"].is_null());
    }

    #[tokio::test]
    async fn cache_maintenance_endpoints() {
        let state = AppState::fake();
        let rec = NutritionRecord {
            calories: 52.0,
            ..Default::default()
        };
        state
            .cache
            .set("pear", &rec, NutritionSource::Usda, 0.9, 100.0, None)
            .await;

        let (status, body) = call(state.clone(), Method::GET, "/api/v1/nutrition/cache/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["entries"], 1);

        let (status, _) = call(
            state.clone(),
            Method::DELETE,
            "/api/v1/nutrition/cache",
            Some(json!({"name": "pear", "serving_grams": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(state.clone(), Method::POST, "/api/v1/nutrition/cache/cleanup", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["removed"], 0);

        let (_, body) = call(state, Method::GET, "/api/v1/nutrition/cache/stats", None).await;
        assert_eq!(json_of(&body)["entries"], 0);
    }
}
