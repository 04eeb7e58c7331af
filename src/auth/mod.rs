/*!
 * # Authentication and Authorization
 *
 * Two credential sources resolve to the same `users` row: password logins
 * (argon2id hashes) and Google OAuth (see [`oauth`]). Both end in
 * [`AuthService::issue_tokens`], which projects a fixed whitelist of user
 * fields (id, email, name, avatar, role) into every access token. The
 * [`AuthUser`] extractor projects the same fields back out of the token for
 * request handlers, and [`policy`] is the one place role checks happen.
 *
 * Sessions are stateless: lifetime is governed entirely by token expiry and
 * the refresh flow. Nothing is stored server-side per session.
 */

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{user, User, UserModel, UserRole},
    errors::ServiceError,
};

pub mod oauth;
pub mod policy;

/// Claim structure for issued tokens.
///
/// Only the whitelisted user fields appear here; anything else on the user
/// row stays server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,                // Subject (user id)
    pub email: Option<String>,      // User's email
    pub name: Option<String>,       // User's display name
    pub avatar_url: Option<String>, // Avatar URL, if any
    pub role: String,               // Role flag ("standard" | "admin")
    pub jti: String,                // Unique token id
    pub iat: i64,                   // Issued at
    pub exp: i64,                   // Expiration
    pub nbf: i64,                   // Not valid before
    pub iss: String,                // Issuer
    pub aud: String,                // Audience
}

/// Authenticated user data extracted from the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = ServiceError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;
        let role = UserRole::from_str(&claims.role)
            .map_err(|_| ServiceError::Unauthorized("invalid token role".to_string()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
            name: claims.name,
            avatar_url: claims.avatar_url,
            role,
        })
    }
}

impl FromRequestParts<crate::AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("invalid authorization header".to_string()))?;

        let claims = state.services.auth.validate_token(token)?;
        AuthUser::try_from(claims)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Input for credential registration
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Profile fields provided by an OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Handles credential verification and token issuance
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
    http: reqwest::Client,
    email_verification_url: Option<String>,
}

impl AuthService {
    pub fn new(
        config: AuthConfig,
        db: Arc<DatabaseConnection>,
        email_verification_url: Option<String>,
    ) -> Self {
        Self {
            config,
            db,
            http: reqwest::Client::new(),
            email_verification_url,
        }
    }

    /// Register a new credential-based account and issue its first tokens.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<(UserModel, TokenPair), ServiceError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        if !self.verify_email_ownership(&input.email).await? {
            return Err(ServiceError::ValidationError(
                "Email address could not be verified".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(Some(password_hash)),
            avatar_url: Set(None),
            role: Set(UserRole::Standard),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;

        let tokens = self.issue_tokens(&created)?;
        info!("Registered user {}", created.id);
        Ok((created, tokens))
    }

    /// Verify credentials and issue tokens.
    ///
    /// A missing user, a missing hash (OAuth-only account), and a wrong
    /// password all collapse into the same generic failure so callers cannot
    /// distinguish which occurred.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(UserModel, TokenPair), ServiceError> {
        let invalid = || ServiceError::AuthError("Invalid credentials".to_string());

        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(invalid)?;

        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !verify_password(hash, password) {
            warn!("Failed login attempt for {}", email);
            return Err(invalid());
        }

        let tokens = self.issue_tokens(&user)?;
        Ok((user, tokens))
    }

    /// Resolve an OAuth profile to the common user row, creating it on first
    /// login. OAuth accounts carry no password hash.
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn upsert_oauth_user(&self, profile: OAuthProfile) -> Result<(UserModel, TokenPair), ServiceError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(profile.email.clone()))
            .one(&*self.db)
            .await?;

        let user = match existing {
            Some(found) => {
                let mut active: user::ActiveModel = found.into();
                active.name = Set(profile.name);
                active.avatar_url = Set(profile.avatar_url);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?
            }
            None => {
                let now = Utc::now();
                let model = user::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    email: Set(profile.email),
                    name: Set(profile.name),
                    password_hash: Set(None),
                    avatar_url: Set(profile.avatar_url),
                    role: Set(UserRole::Standard),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&*self.db).await?
            }
        };

        let tokens = self.issue_tokens(&user)?;
        Ok((user, tokens))
    }

    /// Issue an access/refresh token pair for a user.
    pub fn issue_tokens(&self, user: &UserModel) -> Result<TokenPair, ServiceError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;

        let access_claims = Claims {
            sub: user.id.to_string(),
            email: Some(user.email.clone()),
            name: Some(user.name.clone()),
            avatar_url: user.avatar_url.clone(),
            role: user.role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh tokens carry only the subject; the profile projection is
        // re-read from the database on refresh.
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            email: None,
            name: None,
            avatar_url: None,
            role: user.role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access_claims, &key)
            .map_err(|e| ServiceError::JwtError(e.to_string()))?;
        let refresh_token = encode(&header, &refresh_claims, &key)
            .map_err(|e| ServiceError::JwtError(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            refresh_expires_in: self.config.refresh_token_expiration.as_secs() as i64,
        })
    }

    /// Decode and validate a token, returning its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token has expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid authentication token".to_string()),
        })?;

        Ok(data.claims)
    }

    /// Exchange a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.validate_token(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

        let user = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid authentication token".to_string()))?;

        self.issue_tokens(&user)
    }

    /// Delegate email ownership proof to the configured external endpoint.
    /// Returns true when no endpoint is configured.
    async fn verify_email_ownership(&self, email: &str) -> Result<bool, ServiceError> {
        let Some(url) = self.email_verification_url.as_deref() else {
            return Ok(true);
        };

        #[derive(Deserialize)]
        struct VerificationResponse {
            verified: bool,
        }

        let response = self
            .http
            .get(url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?
            .json::<VerificationResponse>()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        Ok(response.verified)
    }
}

/// Hash a password with argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

/// Constant-result password check; malformed stored hashes verify as false.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "unit_test_secret_key_that_is_long_enough".to_string(),
            "peakform-auth".to_string(),
            "peakform-api".to_string(),
            Duration::from_secs(1800),
            Duration::from_secs(7 * 24 * 3600),
        );
        // The db is unused by the pure token/hash paths under test.
        let db = Arc::new(DatabaseConnection::Disconnected);
        AuthService::new(config, db, None)
    }

    fn test_user() -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            email: "lifter@example.com".to_string(),
            name: "Test Lifter".to_string(),
            password_hash: None,
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            role: UserRole::Standard,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "wrong password"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn token_round_trip_preserves_whitelisted_fields() {
        let service = test_service();
        let user = test_user();

        let pair = service.issue_tokens(&user).expect("issue tokens");
        let claims = service
            .validate_token(&pair.access_token)
            .expect("validate");

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email.as_deref(), Some("lifter@example.com"));
        assert_eq!(claims.name.as_deref(), Some("Test Lifter"));
        assert_eq!(
            claims.avatar_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(claims.role, "standard");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let pair = service.issue_tokens(&test_user()).expect("issue tokens");

        let mut token = pair.access_token;
        token.push('x');
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn auth_user_projection_from_claims() {
        let service = test_service();
        let mut user = test_user();
        user.role = UserRole::Admin;

        let pair = service.issue_tokens(&user).expect("issue tokens");
        let claims = service
            .validate_token(&pair.access_token)
            .expect("validate");
        let auth_user = AuthUser::try_from(claims).expect("projection");

        assert_eq!(auth_user.id, user.id);
        assert!(auth_user.is_admin());
    }

    #[test]
    fn bogus_subject_fails_projection() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: None,
            name: None,
            avatar_url: None,
            role: "standard".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: 0,
            exp: 0,
            nbf: 0,
            iss: "x".to_string(),
            aud: "y".to_string(),
        };
        assert!(AuthUser::try_from(claims).is_err());
    }
}
