use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::{
    api::models::*,
    config::SearchConfig,
    search::{RawFilter, RecipeSearch, SqliteStore},
    Result,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: RecipeSearch<SqliteStore>,
}

impl AppState {
    pub fn new(pool: sqlx::SqlitePool, config: SearchConfig) -> Self {
        Self {
            search: RecipeSearch::with_config(SqliteStore::new(pool), config),
        }
    }
}

/// GET /api/recipes - Search recipes
pub async fn search_recipes(
    State(state): State<AppState>,
    Query(params): Query<RawFilter>,
) -> Result<Json<SearchResponse>> {
    debug!("Search request: {:?}", params);

    let results = state.search.search(&params).await?;

    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>> {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(state.search.store().pool())
        .await
        .is_ok();

    Ok(Json(ReadinessResponse {
        ready: db_healthy,
        database: if db_healthy { "ok" } else { "error" }.to_string(),
    }))
}
