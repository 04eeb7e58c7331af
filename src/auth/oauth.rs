//! Google OAuth login flow.
//!
//! The flow resolves to the same user row as credential logins: after the
//! code exchange we fetch the provider profile and hand it to
//! `AuthService::upsert_oauth_user`.

use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{auth::OAuthProfile, config::AppConfig, errors::ServiceError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Profile payload returned by the provider's userinfo endpoint
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Client for the Google authorization-code flow
#[derive(Clone)]
pub struct GoogleOAuth {
    client: BasicClient,
    http: reqwest::Client,
}

impl GoogleOAuth {
    /// Build the client from configuration; `None` when OAuth is not
    /// configured for this deployment.
    pub fn from_config(cfg: &AppConfig) -> Option<Result<Self, ServiceError>> {
        if !cfg.oauth_enabled() {
            return None;
        }
        let client_id = cfg.google_client_id.clone()?;
        let client_secret = cfg.google_client_secret.clone()?;
        let redirect_url = cfg.google_redirect_url.clone()?;

        Some(Self::new(client_id, client_secret, redirect_url))
    }

    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_url: String,
    ) -> Result<Self, ServiceError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let redirect = RedirectUrl::new(redirect_url)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let client = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Authorization URL the client should be redirected to, plus the CSRF
    /// state token to verify on callback.
    pub fn authorize_url(&self) -> (String, String) {
        let (url, csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();
        (url.to_string(), csrf.secret().clone())
    }

    /// Exchange the callback code and fetch the provider profile.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: String) -> Result<OAuthProfile, ServiceError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("token exchange: {e}")))?;

        let info = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("userinfo fetch: {e}")))?
            .error_for_status()
            .map_err(|e| ServiceError::ExternalServiceError(format!("userinfo fetch: {e}")))?
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("userinfo parse: {e}")))?;

        let name = info.name.unwrap_or_else(|| info.email.clone());
        Ok(OAuthProfile {
            email: info.email,
            name,
            avatar_url: info.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_scopes_and_state() {
        let oauth = GoogleOAuth::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/google/callback".to_string(),
        )
        .expect("client");

        let (url, state) = oauth.authorize_url();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("scope="));
        assert!(url.contains("client-id"));
        assert!(!state.is_empty());
    }

    #[test]
    fn from_config_is_none_without_credentials() {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "a_secret_key_that_is_long_enough_for_validation".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        );
        assert!(GoogleOAuth::from_config(&cfg).is_none());
    }
}
