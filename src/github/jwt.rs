//! App-identity JWTs for GitHub App authentication.
//!
//! GitHub Apps authenticate in two steps:
//! 1. App JWT - short-lived JWT signed with the app's private key, used to
//!    list installations and mint installation tokens
//! 2. Installation Access Token - scoped token for repository operations
//!
//! This module covers the first step.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GitHubError;

/// Lifetime of an App JWT. The expiration claim must not be accepted for
/// processing on or after this point, and GitHub rejects longer lifetimes.
pub const APP_JWT_LIFETIME_SECS: i64 = 5 * 60;

/// The GitHub App credentials used to mint JWTs.
#[derive(Clone)]
pub struct AppIdentity {
    /// GitHub App ID (numeric)
    pub application_id: i64,
    /// PEM-encoded RSA private key
    pub private_key_pem: Vec<u8>,
}

impl AppIdentity {
    pub fn new(application_id: i64, private_key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            application_id,
            private_key_pem: private_key_pem.into(),
        }
    }
}

impl fmt::Debug for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppIdentity")
            .field("application_id", &self.application_id)
            .field("private_key_pem", &"[redacted]")
            .finish()
    }
}

/// JWT claims for GitHub App authentication.
/// GitHub requires: iat (issued at), exp (expiration), iss (issuer = app_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issuer - the GitHub App ID, sent as a JSON number
    pub iss: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// A signed App JWT. Use it for a single authenticated call and drop it.
#[derive(Clone)]
pub struct SignedAppJwt {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for SignedAppJwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAppJwt")
            .field("token", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Sign an App JWT for `identity`, issued at `now`.
///
/// The token is signed with RS256 (RSA-SHA256) and expires exactly
/// [`APP_JWT_LIFETIME_SECS`] after `now`. Only `iss`, `iat` and `exp` are set.
///
/// # Example
/// ```ignore
/// let jwt = sign_app_jwt(&identity, Utc::now())?;
/// // Use: Authorization: Bearer {jwt.token}
/// ```
pub fn sign_app_jwt(identity: &AppIdentity, now: DateTime<Utc>) -> Result<SignedAppJwt, GitHubError> {
    let expires_at = now + Duration::seconds(APP_JWT_LIFETIME_SECS);

    let claims = AppClaims {
        iss: identity.application_id,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let encoding_key =
        EncodingKey::from_rsa_pem(&identity.private_key_pem).map_err(GitHubError::KeyParse)?;

    let token = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(GitHubError::Signing)?;

    tracing::debug!(
        app_id = identity.application_id,
        exp = claims.exp,
        "Signed GitHub App JWT"
    );

    Ok(SignedAppJwt {
        token,
        issued_at: now,
        expires_at,
    })
}
