use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::{ActiveUser, RequestId},
    models::{CompareScope, CompatibilityResult},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Compares the active user against every other user
pub async fn compare_all(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: ActiveUser,
) -> AppResult<Json<CompatibilityResult>> {
    compare(state, request_id, user, CompareScope::All).await
}

/// Compares the active user against the users they follow
pub async fn compare_following(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: ActiveUser,
) -> AppResult<Json<CompatibilityResult>> {
    compare(state, request_id, user, CompareScope::Following).await
}

async fn compare(
    state: AppState,
    request_id: RequestId,
    ActiveUser(user_id): ActiveUser,
    scope: CompareScope,
) -> AppResult<Json<CompatibilityResult>> {
    tracing::info!(
        request_id = %request_id,
        user_id,
        scope = %scope,
        "Processing compatibility request"
    );

    let result = state
        .engine
        .compare(state.store.as_ref(), user_id, scope)
        .await?;

    tracing::info!(
        request_id = %request_id,
        best_match_user_id = ?result.best_match_user_id,
        "Compatibility request completed"
    );

    Ok(Json(result))
}
