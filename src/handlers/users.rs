use crate::handlers::common::{map_service_error, success_response};
use crate::{auth::AuthUser, errors::ApiError, AppState};
use axum::{extract::State, routing::get, Router};

/// Creates the router for profile endpoints
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile))
        .route("/me/purchases", get(purchase_history))
}

/// The caller's stored profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Stored profile for the session user"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let profile = state
        .services
        .accounts
        .get_profile(user.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(profile))
}

/// Programs the caller has purchased, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/me/purchases",
    responses(
        (status = 200, description = "Purchase history"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn purchase_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let purchases = state
        .services
        .accounts
        .purchase_history(user.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchases))
}
