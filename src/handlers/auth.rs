use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{AuthUser, TokenPair},
    entities::UserModel,
    errors::{ApiError, ServiceError},
    events::Event,
    AppState,
};
use axum::{
    extract::{Json, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for authentication endpoints
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/me", get(current_user))
        .route("/google", get(google_authorize))
        .route("/google/callback", get(google_callback))
}

/// Register a credential-based account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; token pair issued"),
        (status = 400, description = "Malformed registration payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let (user, tokens) = state
        .services
        .auth
        .register(crate::auth::RegisterInput {
            email: payload.email,
            password: payload.password,
            name: payload.name,
        })
        .await
        .map_err(map_service_error)?;

    state
        .event_sender
        .send_or_log(Event::UserRegistered(user.id))
        .await;

    Ok(created_response(AuthResponse { user, tokens }))
}

/// Verify credentials and issue a token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued"),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let (user, tokens) = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(map_service_error)?;

    state
        .event_sender
        .send_or_log(Event::UserLoggedIn(user.id))
        .await;

    Ok(success_response(AuthResponse { user, tokens }))
}

/// Exchange a refresh token for a fresh pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Fresh token pair"),
        (status = 401, description = "Invalid or expired refresh token", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state
        .services
        .auth
        .refresh(&payload.refresh_token)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tokens))
}

/// The session projection for the calling token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Whitelisted session fields"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn current_user(user: AuthUser) -> impl IntoResponse {
    success_response(user)
}

/// Redirect to the OAuth provider's consent screen
#[utoipa::path(
    get,
    path = "/auth/google",
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 404, description = "OAuth login not configured")
    ),
    tag = "Auth"
)]
pub async fn google_authorize(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let oauth = state
        .services
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("OAuth login is not configured".to_string()))?;

    let (url, _csrf) = oauth.authorize_url();
    Ok(Redirect::to(&url))
}

/// Handle the provider callback: exchange the code, resolve the user, issue tokens
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(("code" = String, Query, description = "Authorization code from the provider")),
    responses(
        (status = 200, description = "Token pair for the resolved account"),
        (status = 404, description = "OAuth login not configured"),
        (status = 502, description = "Provider exchange failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let oauth = state
        .services
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("OAuth login is not configured".to_string()))?;

    if let Some(error) = query.error {
        return Err(map_service_error(ServiceError::AuthError(format!(
            "Provider returned an error: {error}"
        ))));
    }
    let code = query.code.ok_or_else(|| {
        map_service_error(ServiceError::BadRequest(
            "missing authorization code".to_string(),
        ))
    })?;

    let profile = oauth.exchange_code(code).await.map_err(map_service_error)?;
    let (user, tokens) = state
        .services
        .auth
        .upsert_oauth_user(profile)
        .await
        .map_err(map_service_error)?;

    state
        .event_sender
        .send_or_log(Event::UserLoggedIn(user.id))
        .await;

    Ok(success_response(AuthResponse { user, tokens }))
}

// Request/response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// User plus issued tokens; the password hash is never serialized
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserModel,
    pub tokens: TokenPair,
}
