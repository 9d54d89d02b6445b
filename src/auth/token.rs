use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::SessionClaims;
use crate::auth::repo_types::Account;
use crate::config::SessionConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Signing material and expiry policy for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
    pub remember_me_ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            ttl_hours,
            remember_me_ttl_days,
            ..
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs(ttl_hours as u64 * 3600),
            remember_me_ttl: Duration::from_secs(remember_me_ttl_days as u64 * 86_400),
        }
    }
}

impl SessionKeys {
    /// Build and sign claims for an account. Pure except for the session
    /// id draw; persistence of the session record happens in the caller.
    pub fn sign(
        &self,
        account: &Account,
        org_slug: &str,
        remember_me: bool,
    ) -> anyhow::Result<(String, SessionClaims)> {
        let now = OffsetDateTime::now_utc();
        let ttl = if remember_me {
            self.remember_me_ttl
        } else {
            self.ttl
        };
        let exp = now + ttl;
        let claims = SessionClaims {
            sid: Uuid::new_v4(),
            sub: account.id,
            org: account.organization_id,
            org_slug: org_slug.to_string(),
            email: account.email.clone(),
            role: account.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = %account.id, session_id = %claims.sid, "session token signed");
        Ok((token, claims))
    }

    /// Verify signature and expiry. Pure computation, no I/O; a signed,
    /// unexpired token is self-certifying. Every failure collapses into
    /// the same opaque authentication error.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "session token rejected");
            AppError::Authentication
        })?;
        // exp exactly equal to now counts as expired
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        if data.claims.exp <= now {
            return Err(AppError::Authentication);
        }
        Ok(data.claims)
    }
}

/// One-way hash of an issued token, the only form the store ever sees.
pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
