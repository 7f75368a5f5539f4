use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{PerQuery, Post, RecommendResponse, RelateQuery, User},
};

/// Liveness probe
pub async fn ping() -> &'static str {
    "pong"
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Resolves the requested limit against the configured default and maximum
fn resolve_limit(requested: Option<usize>, state: &AppState) -> AppResult<usize> {
    let limit = requested.unwrap_or(state.default_limit);
    if limit == 0 || limit > state.max_limit {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            state.max_limit
        )));
    }
    Ok(limit)
}

/// Personalized posts for a user
pub async fn per(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<PerQuery>, QueryRejection>,
) -> AppResult<Json<RecommendResponse>> {
    let Query(query) = query?;
    let limit = resolve_limit(query.limit, &state)?;
    let mut user = User::new(query.user_id);

    let result = state.per_recommender.recommend(&mut user, limit).await;
    if let Some(posts) = &result {
        state.shown_posts.handle(user.id, posts);
    }

    tracing::info!(
        request_id = %request_id,
        user_id = user.id,
        limit,
        found = ?result.as_ref().map(Vec::len),
        "Served personalized recommendation"
    );

    Ok(Json(RecommendResponse::from_result(result.as_deref())))
}

/// Posts related to a seed post, for a user
pub async fn relate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RelateQuery>, QueryRejection>,
) -> AppResult<Json<RecommendResponse>> {
    let Query(query) = query?;
    let limit = resolve_limit(query.limit, &state)?;
    let mut user = User::new(query.user_id);
    let seed_post = Post::new(query.seed_post_id);

    let result = state
        .relate_recommender
        .recommend(&seed_post, &mut user, limit)
        .await;
    if let Some(posts) = &result {
        state.shown_posts.handle(user.id, posts);
    }

    tracing::info!(
        request_id = %request_id,
        user_id = user.id,
        seed_id = seed_post.id,
        limit,
        found = ?result.as_ref().map(Vec::len),
        "Served related recommendation"
    );

    Ok(Json(RecommendResponse::from_result(result.as_deref())))
}
