use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, errors, handlers};

/// OpenAPI document for the v1 API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::current_user,
        handlers::auth::google_authorize,
        handlers::auth::google_callback,
        handlers::catalog::list_programs,
        handlers::catalog::get_program,
        handlers::catalog::create_program,
        handlers::catalog::update_program,
        handlers::catalog::delete_program,
        handlers::gyms::list_gyms,
        handlers::gyms::get_gym,
        handlers::gyms::create_gym,
        handlers::carts::get_cart,
        handlers::carts::replace_cart,
        handlers::checkout::create_order,
        handlers::checkout::verify_payment,
        handlers::users::get_profile,
        handlers::users::purchase_history,
    ),
    components(schemas(
        errors::ErrorResponse,
        errors::PriceMismatch,
        auth::TokenPair,
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::RefreshTokenRequest,
        handlers::catalog::CreateProgramRequest,
        handlers::gyms::CreateGymRequest,
        handlers::carts::CartSyncRequest,
        handlers::carts::CartItemRequest,
        handlers::carts::CartResponse,
        handlers::carts::CartItemView,
        handlers::checkout::VerifyPaymentRequest,
        handlers::checkout::VerifyPaymentResponse,
        handlers::checkout::CreateOrderResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login, and token refresh"),
        (name = "Catalog", description = "Training program catalog"),
        (name = "Gyms", description = "Gym directory"),
        (name = "Cart", description = "Cart synchronization"),
        (name = "Checkout", description = "Order creation and payment verification"),
        (name = "Users", description = "Profile and purchase history"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at /docs
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
