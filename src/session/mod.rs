//! Session issuer: credential login, bearer-token verification, refresh.
//!
//! Tokens are opaque signed bearers carrying only the account id and
//! expiry, never role or scope; both are re-derived from the freshly
//! loaded account on every authenticated request, so a stale claim can
//! never escalate privileges.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config;
use crate::crypto;
use crate::error::AuthError;
use crate::model::{Account, AccountId, Role};
use crate::store::Store;

/// Authenticated identity attached to a request after token verification.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: AccountId,
    pub role: Role,
    pub email: String,
}

impl Principal {
    pub fn of(account: &Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            email: account.email.clone(),
        }
    }
}

/// JWT claims. Account id and expiry only.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(account: AccountId, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: account.0,
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Result of a successful refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub expires_in: i64,
}

/// Signing material and lifetimes; access and refresh use independent
/// secrets so one leaked key never unlocks the other token class.
#[derive(Debug, Clone)]
pub struct SessionKeys {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl SessionKeys {
    pub fn from_config() -> Self {
        let session = &config::config().session;
        Self {
            access_secret: session.access_secret.clone(),
            refresh_secret: session.refresh_secret.clone(),
            access_ttl_secs: session.access_ttl_secs,
            refresh_ttl_secs: session.refresh_ttl_secs,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TokenUse {
    Access,
    Refresh,
}

pub struct SessionIssuer {
    store: Arc<dyn Store>,
    keys: SessionKeys,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn Store>, keys: SessionKeys) -> Self {
        Self { store, keys }
    }

    pub fn from_config(store: Arc<dyn Store>) -> Self {
        Self::new(store, SessionKeys::from_config())
    }

    /// Credential login. The failure is identical for unknown email and
    /// wrong password; the reception activation gate is applied only after
    /// the password verified, so gate state is never disclosed to guessers.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let account = self
            .store
            .account_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !crypto::verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        activation_gate(&account)?;

        tracing::info!("login: {} ({})", account.email, account.role);
        self.issue_pair(account.id)
    }

    /// Verify an access token and re-load the principal. The activation
    /// gate is re-applied on every call: a previously issued token stops
    /// working the instant a reception account is deactivated or its
    /// documents rejected.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.verify(token, TokenUse::Access)?;
        let account = self
            .store
            .account(AccountId(claims.sub))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        activation_gate(&account)?;
        Ok(Principal::of(&account))
    }

    /// Mint a fresh access token from a refresh token.
    ///
    /// Verifies signature, expiry, and the account's continued existence.
    /// Deliberately does NOT re-check the activation gate: the per-request
    /// gate in `authenticate` already rejects any access token a
    /// deactivated reception account mints here, so the freshly minted
    /// token fails on first use. Adding one `activation_gate` call below
    /// closes the window entirely if the product decides to.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError> {
        let claims = self.verify(refresh_token, TokenUse::Refresh)?;
        let account_id = AccountId(claims.sub);
        if self.store.account(account_id).await?.is_none() {
            return Err(AuthError::InvalidToken);
        }

        let access_token = self.sign(account_id, TokenUse::Access)?;
        Ok(AccessGrant {
            access_token,
            expires_in: self.keys.access_ttl_secs,
        })
    }

    fn issue_pair(&self, account: AccountId) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(account, TokenUse::Access)?,
            refresh_token: self.sign(account, TokenUse::Refresh)?,
            expires_in: self.keys.access_ttl_secs,
        })
    }

    fn sign(&self, account: AccountId, token_use: TokenUse) -> Result<String, AuthError> {
        let (secret, ttl) = match token_use {
            TokenUse::Access => (&self.keys.access_secret, self.keys.access_ttl_secs),
            TokenUse::Refresh => (&self.keys.refresh_secret, self.keys.refresh_ttl_secs),
        };
        let claims = Claims::new(account, ttl);
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|_| AuthError::InvalidToken)
    }

    fn verify(&self, token: &str, token_use: TokenUse) -> Result<Claims, AuthError> {
        let secret = match token_use {
            TokenUse::Access => &self.keys.access_secret,
            TokenUse::Refresh => &self.keys.refresh_secret,
        };
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// The reception-only activation gate. Roles other than reception pass
/// unconditionally; their flags are inert.
pub fn activation_gate(account: &Account) -> Result<(), AuthError> {
    if account.role.uses_activation_gate()
        && (!account.documents_approved || !account.is_active)
    {
        tracing::debug!(
            "activation gate closed for {} (documents_approved={}, is_active={})",
            account.email,
            account.documents_approved,
            account.is_active
        );
        return Err(AuthError::AccountNotApproved {
            documents_approved: account.documents_approved,
            is_active: account.is_active,
        });
    }
    Ok(())
}

/// Extract the token from an `Authorization: Bearer ...` header value.
/// Provided for the out-of-scope HTTP layer.
pub fn extract_bearer(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}
