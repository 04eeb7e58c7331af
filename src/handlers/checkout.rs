use crate::handlers::common::map_service_error;
use crate::{
    auth::{policy, AuthUser},
    errors::{ApiError, ServiceError},
    services::checkout::VerifyPaymentInput,
    AppState,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(create_order))
        .route("/verify", post(verify_payment))
}

/// Create a payment-provider order for the caller's server-side cart total
#[utoipa::path(
    post,
    path = "/api/v1/checkout/order",
    responses(
        (status = 200, description = "Provider order for the hosted checkout widget"),
        (status = 400, description = "Cart is empty", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid session token"),
        (status = 502, description = "Payment provider unreachable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .checkout
        .create_payment_order(user.id)
        .await
        .map_err(map_service_error)?;

    Ok(axum::Json(CreateOrderResponse {
        order_id: order.order_id,
        amount: order.amount,
        currency: order.currency,
        key_id: order.key_id,
    }))
}

/// Verify a provider callback and grant the purchased programs
#[utoipa::path(
    post,
    path = "/api/v1/checkout/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified; purchases granted and cart emptied", body = VerifyPaymentResponse),
        (status = 400, description = "Signature mismatch or empty cart", body = VerifyPaymentResponse),
        (status = 401, description = "Missing or invalid session token"),
        (status = 403, description = "userId does not match the session")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // The body carries the user id for wire compatibility; the session is
    // the authority on who is paying.
    let claimed = Uuid::parse_str(&payload.user_id)
        .map_err(|_| map_service_error(ServiceError::Forbidden("invalid userId".to_string())))?;
    policy::require_self_or_admin(&user, claimed).map_err(map_service_error)?;

    let input = VerifyPaymentInput {
        order_id: payload.razorpay_order_id,
        payment_id: payload.razorpay_payment_id,
        signature: payload.razorpay_signature,
    };

    match state.services.checkout.verify_payment(claimed, input).await {
        Ok(_) => Ok((
            StatusCode::OK,
            axum::Json(VerifyPaymentResponse {
                success: true,
                error: None,
            }),
        )),
        // Integrity failures keep the documented `{ success: false }` shape;
        // anything else surfaces as a structured error response.
        Err(ServiceError::PaymentFailed(message)) => Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(VerifyPaymentResponse {
                success: false,
                error: Some(message),
            }),
        )),
        Err(other) => Err(map_service_error(other)),
    }
}

// Request/response DTOs. Field names follow the provider callback contract.

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// Minor currency units, as the provider expects
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}
