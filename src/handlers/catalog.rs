use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::{policy, AuthUser},
    entities::ProgramLevel,
    errors::ApiError,
    services::catalog::{CreateProgramInput, ProgramFilter, UpdateProgramInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for program catalog endpoints
pub fn programs_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_programs).post(create_program))
        .route(
            "/{id}",
            get(get_program).put(update_program).delete(delete_program),
        )
}

/// List programs with optional filters and sorting
#[utoipa::path(
    get,
    path = "/api/v1/programs",
    params(
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("level" = Option<String>, Query, description = "Filter by difficulty level"),
        ("search" = Option<String>, Query, description = "Title substring search"),
        ("sort" = Option<String>, Query, description = "price_asc | price_desc | rating_desc | newest")
    ),
    responses((status = 200, description = "Matching programs")),
    tag = "Catalog"
)]
pub async fn list_programs(
    State(state): State<AppState>,
    Query(filter): Query<ProgramFilter>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let programs = state
        .services
        .catalog
        .list_programs(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(programs))
}

/// Fetch a single program
#[utoipa::path(
    get,
    path = "/api/v1/programs/{id}",
    params(("id" = Uuid, Path, description = "Program id")),
    responses(
        (status = 200, description = "The program"),
        (status = 404, description = "Unknown program id", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let program = state
        .services
        .catalog
        .get_program(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(program))
}

/// Create a program (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/programs",
    request_body = CreateProgramRequest,
    responses(
        (status = 201, description = "Program created"),
        (status = 401, description = "Missing or invalid session token"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_program(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProgramRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    policy::require_admin(&user).map_err(map_service_error)?;
    validate_input(&payload)?;

    let program = state
        .services
        .catalog
        .create_program(CreateProgramInput {
            title: payload.title,
            description: payload.description,
            price: payload.price,
            original_price: payload.original_price,
            level: payload.level,
            category: payload.category,
            instructor: payload.instructor,
            duration: payload.duration,
            image_url: payload.image_url,
            features: payload.features,
            tags: payload.tags,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(program))
}

/// Update a program (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/programs/{id}",
    params(("id" = Uuid, Path, description = "Program id")),
    responses(
        (status = 200, description = "Program updated"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Unknown program id", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn update_program(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProgramInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    policy::require_admin(&user).map_err(map_service_error)?;

    let program = state
        .services
        .catalog
        .update_program(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(program))
}

/// Delete a program (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/programs/{id}",
    params(("id" = Uuid, Path, description = "Program id")),
    responses(
        (status = 204, description = "Program deleted"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Unknown program id", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn delete_program(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    policy::require_admin(&user).map_err(map_service_error)?;

    state
        .services
        .catalog
        .delete_program(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Admin request to add a catalog entry
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProgramRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[schema(value_type = String)]
    pub level: ProgramLevel,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub instructor: String,
    pub duration: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
