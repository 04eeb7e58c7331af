use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::carts::{CartLineInput, CartSyncInput, CartWithItems},
    AppState,
};
use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new().route("/", get(get_cart).put(replace_cart))
}

/// Fetch the caller's persisted cart
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Persisted cart, or the empty-cart shape when none exists"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .get_cart(user.id)
        .await
        .map_err(map_service_error)?;

    let response = match cart {
        Some(cart) => CartResponse::from(cart),
        None => CartResponse::empty(),
    };

    Ok(success_response(response))
}

/// Replace the caller's cart wholesale after price verification
#[utoipa::path(
    put,
    path = "/api/v1/cart",
    request_body = CartSyncRequest,
    responses(
        (status = 200, description = "Authoritative persisted cart"),
        (status = 400, description = "Malformed payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid session token"),
        (status = 422, description = "One or more submitted prices do not match the catalog", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn replace_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CartSyncRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    payload.check_decimal_bounds()?;

    let input = CartSyncInput {
        items: payload
            .items
            .into_iter()
            .map(|item| CartLineInput {
                program_id: item.id,
                title: item.title,
                price: item.price,
                original_price: item.original_price,
                duration: item.duration,
                instructor: item.instructor,
                image_url: item.image,
                category: item.category,
                quantity: item.quantity,
            })
            .collect(),
        applied_promo: payload.applied_promo,
    };

    let cart = state
        .services
        .carts
        .replace_cart(user.id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CartResponse::from(cart)))
}

// Request DTOs. Field names match the storefront wire contract.

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub duration: String,
    pub instructor: String,
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartSyncRequest {
    #[validate(nested)]
    pub items: Vec<CartItemRequest>,
    #[validate(range(min = 0))]
    pub total_items: i64,
    pub total_amount: Decimal,
    #[serde(default)]
    pub applied_promo: Option<String>,
    #[serde(default)]
    pub discount_amount: Decimal,
}

impl CartSyncRequest {
    // The derive validator has no Decimal support; non-negativity of the
    // declared totals is checked here. The values themselves are recomputed
    // server-side and never persisted as submitted.
    fn check_decimal_bounds(&self) -> Result<(), ApiError> {
        if self.total_amount < Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "totalAmount must be non-negative".to_string(),
            ));
        }
        if self.discount_amount < Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "discountAmount must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

// Response DTOs

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub duration: String,
    pub instructor: String,
    pub image: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemView>,
    pub total_items: i32,
    pub total_amount: Decimal,
    pub applied_promo: Option<String>,
    pub discount_amount: Decimal,
}

impl CartResponse {
    /// Shape returned when the user has no cart row yet.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_amount: Decimal::ZERO,
            applied_promo: None,
            discount_amount: Decimal::ZERO,
        }
    }
}

impl From<CartWithItems> for CartResponse {
    fn from(value: CartWithItems) -> Self {
        Self {
            items: value
                .items
                .into_iter()
                .map(|item| CartItemView {
                    id: item.program_id,
                    title: item.title,
                    price: item.unit_price,
                    original_price: item.original_price,
                    duration: item.duration,
                    instructor: item.instructor,
                    image: item.image_url,
                    category: item.category,
                    quantity: item.quantity,
                    line_total: item.line_total,
                })
                .collect(),
            total_items: value.cart.total_items,
            total_amount: value.cart.total_amount,
            applied_promo: value.cart.applied_promo,
            discount_amount: value.cart.discount_amount,
        }
    }
}
