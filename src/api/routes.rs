use axum::http::{header, Method};
use axum::{routing::get, Router};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::{self, AppState};

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    // Public API routes - read-only
    let api_routes = Router::new()
        .route("/recipes", get(handlers::search_recipes))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            // CORS - allow all origins for the read-only API
            CorsLayer::new()
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_origin(tower_http::cors::Any)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewRecipe;
    use crate::db::{recipes, users};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    // Helper to create test app state
    async fn create_test_state() -> AppState {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        AppState::new(pool, crate::config::SearchConfig::default())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_routes_exist() {
        let state = create_test_state().await;

        let (status, body) = get(create_router(state.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get(create_router(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let state = create_test_state().await;
        let pool = state.search.store().pool().clone();
        let user = users::create_user(&pool, "chef").await.unwrap();
        for (title, prep_time) in [("Quick Omelette", 10), ("Slow Roast", 240)] {
            recipes::create_recipe(
                &pool,
                &NewRecipe {
                    user_id: user.id,
                    title: title.to_string(),
                    description: None,
                    prep_time,
                    servings: 2,
                    created_at: None,
                },
            )
            .await
            .unwrap();
        }

        let (status, body) = get(create_router(state.clone()), "/api/recipes?maxPrepTime=30").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["title"], "Quick Omelette");
        assert_eq!(body["results"][0]["author"]["username"], "chef");

        // No match is a successful, empty response
        let (status, body) = get(create_router(state), "/api/recipes?categoryIds=42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert!(body["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_filter_is_bad_request() {
        let state = create_test_state().await;

        let (status, body) = get(create_router(state), "/api/recipes?maxPrepTime=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("maxPrepTime"));
    }
}
