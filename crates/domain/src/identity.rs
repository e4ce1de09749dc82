//! Identity service: registration, credential validation and tokens.

use chrono::{Duration, Utc};
use common::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::{NewUser, UserRecord, UserStore};

use crate::error::{DomainError, Result};

/// Token signing parameters, supplied from configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expiry: Duration,
}

impl TokenConfig {
    /// Creates a config with the given secret and expiry in seconds.
    pub fn new(secret: impl Into<String>, expiry_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry: Duration::seconds(expiry_secs),
        }
    }
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    pub email: String,
    /// Expiration, seconds since the epoch.
    pub exp: usize,
    /// Issued-at, seconds since the epoch.
    pub iat: usize,
}

/// A user as exposed to clients: everything but the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Successful login response: a signed token plus the user it names.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

/// Service for account registration and credential checks.
pub struct AuthService<S> {
    store: S,
    config: TokenConfig,
}

impl<S: UserStore> AuthService<S> {
    /// Creates a new identity service.
    pub fn new(store: S, config: TokenConfig) -> Self {
        Self { store, config }
    }

    /// Registers a new account. The password is hashed with bcrypt
    /// before it reaches the store; the returned profile never carries
    /// the hash.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserProfile> {
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    /// Checks an email/password pair. Returns `None` for an unknown
    /// email or a wrong password; the two cases are indistinguishable
    /// to the caller.
    #[tracing::instrument(skip(self, password))]
    pub async fn validate(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Ok(None);
        };

        // bcrypt::verify compares in constant time.
        if bcrypt::verify(password, &user.password_hash)? {
            Ok(Some(user.into()))
        } else {
            Ok(None)
        }
    }

    /// Validates credentials and issues a signed, time-limited token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let user = self
            .validate(email, password)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let token = self.issue_token(&user)?;
        tracing::debug!(user_id = %user.id, "login succeeded");
        Ok(AuthPayload { token, user })
    }

    /// Signs a token for the given user.
    pub fn issue_token(&self, user: &UserProfile) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: (now + self.config.expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_ref()),
        )?)
    }

    /// Decodes and validates a bearer token. Any failure (bad
    /// signature, malformed, expired) is an opaque invalid-token error.
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| DomainError::InvalidToken)
    }

    /// Re-resolves the user a token subject refers to. Used on every
    /// authenticated request so a deleted account stops authenticating
    /// immediately.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.store.find_user_by_id(id).await?)
    }
}
