use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{policy, AuthUser},
    errors::ApiError,
    services::gyms::CreateGymInput,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for gym directory endpoints
pub fn gyms_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_gyms).post(create_gym))
        .route("/{id}", get(get_gym))
}

#[derive(Debug, Deserialize)]
pub struct GymListQuery {
    pub city: Option<String>,
}

/// List gym locations
#[utoipa::path(
    get,
    path = "/api/v1/gyms",
    params(("city" = Option<String>, Query, description = "Filter by city")),
    responses((status = 200, description = "Gym locations")),
    tag = "Gyms"
)]
pub async fn list_gyms(
    State(state): State<AppState>,
    Query(query): Query<GymListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let gyms = state
        .services
        .gyms
        .list_gyms(query.city)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(gyms))
}

/// Fetch a single gym
#[utoipa::path(
    get,
    path = "/api/v1/gyms/{id}",
    params(("id" = Uuid, Path, description = "Gym id")),
    responses(
        (status = 200, description = "The gym"),
        (status = 404, description = "Unknown gym id", body = crate::errors::ErrorResponse)
    ),
    tag = "Gyms"
)]
pub async fn get_gym(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let gym = state
        .services
        .gyms
        .get_gym(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(gym))
}

/// Register a gym location (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/gyms",
    request_body = CreateGymRequest,
    responses(
        (status = 201, description = "Gym created"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer_auth" = [])),
    tag = "Gyms"
)]
pub async fn create_gym(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateGymRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    policy::require_admin(&user).map_err(map_service_error)?;
    validate_input(&payload)?;

    let gym = state
        .services
        .gyms
        .create_gym(CreateGymInput {
            name: payload.name,
            city: payload.city,
            address: payload.address,
            description: payload.description,
            image_url: payload.image_url,
            phone: payload.phone,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(gym))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGymRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}
