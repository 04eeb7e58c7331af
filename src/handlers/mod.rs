pub mod auth;
pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod gyms;
pub mod users;

use crate::auth::{oauth::GoogleOAuth, AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::{
    AccountService, CartService, CatalogService, CheckoutService, GymService, RazorpayClient,
};
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub catalog: Arc<CatalogService>,
    pub gyms: Arc<GymService>,
    pub carts: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub accounts: Arc<AccountService>,
    pub oauth: Option<Arc<GoogleOAuth>>,
}

impl AppServices {
    /// Build the service container. Everything shares the one pool and the
    /// one event channel; nothing constructs its own connection.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let auth_config = AuthConfig::new(
            config.jwt_secret.clone(),
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            Duration::from_secs(config.jwt_expiration as u64),
            Duration::from_secs(config.refresh_token_expiration as u64),
        );
        let auth = Arc::new(AuthService::new(
            auth_config,
            db_pool.clone(),
            config.email_verification_url.clone(),
        ));

        let razorpay = Arc::new(RazorpayClient::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
            config.razorpay_base_url.clone(),
        ));

        let oauth = match GoogleOAuth::from_config(config) {
            Some(Ok(client)) => Some(Arc::new(client)),
            Some(Err(e)) => return Err(e),
            None => None,
        };

        let catalog = Arc::new(CatalogService::new(db_pool.clone(), event_sender.clone()));
        let gyms = Arc::new(GymService::new(db_pool.clone()));
        let carts = Arc::new(CartService::new(db_pool.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db_pool.clone(),
            event_sender.clone(),
            razorpay,
            config.currency.clone(),
        ));
        let accounts = Arc::new(AccountService::new(db_pool));

        Ok(Self {
            auth,
            catalog,
            gyms,
            carts,
            checkout,
            accounts,
            oauth,
        })
    }
}
