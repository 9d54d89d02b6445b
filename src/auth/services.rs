use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::claims::SessionClaims;
use crate::auth::password::verify_password_blocking;
use crate::auth::repo_types::Account;
use crate::auth::sessions::{NewSessionRecord, SessionRecord};
use crate::auth::token::{token_hash, SessionKeys};
use crate::error::AppError;
use crate::orgs::repo_types::{OrgSummary, Organization};
use crate::security;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an email/password pair against a tenant-scoped account.
///
/// Unknown email and wrong password return the identical error; nothing in
/// the response distinguishes the two. On success, `last_login_at` is
/// updated off the response path.
pub async fn verify_credentials(
    db: &PgPool,
    organization_id: Uuid,
    email: &str,
    password: &str,
) -> Result<Account, AppError> {
    let normalized = normalize_email(email);
    let account = Account::find_by_org_and_email(db, organization_id, &normalized).await?;

    let account = match account {
        Some(account) => account,
        None => {
            security::login_failed(Some(organization_id), &normalized);
            return Err(AppError::Authentication);
        }
    };

    let ok =
        verify_password_blocking(password.to_string(), account.password_hash.clone()).await?;
    if !ok {
        security::login_failed(Some(organization_id), &normalized);
        return Err(AppError::Authentication);
    }

    touch_last_login(db, account.id);
    Ok(account)
}

/// Outcome of a login attempt on the global (tenant-less) surface.
#[derive(Debug)]
pub enum GlobalLogin {
    /// Exactly one account matched: proceed to issue a session.
    Single(Account),
    /// The email matched accounts in several organizations; the caller
    /// resolves which one was meant.
    Ambiguous(Vec<OrgSummary>),
}

/// Credential check across all tenants, for the global login surface.
pub async fn verify_across_organizations(
    db: &PgPool,
    email: &str,
    password: &str,
) -> Result<GlobalLogin, AppError> {
    let normalized = normalize_email(email);
    let accounts = Account::find_all_by_email(db, &normalized).await?;

    let mut matched = Vec::new();
    for account in accounts {
        let ok =
            verify_password_blocking(password.to_string(), account.password_hash.clone()).await?;
        if ok {
            matched.push(account);
        }
    }

    if matched.len() > 1 {
        let org_ids: Vec<Uuid> = matched.iter().map(|a| a.organization_id).collect();
        let orgs = Organization::summaries_by_ids(db, &org_ids).await?;
        return Ok(GlobalLogin::Ambiguous(orgs));
    }
    match matched.pop() {
        Some(account) => {
            touch_last_login(db, account.id);
            Ok(GlobalLogin::Single(account))
        }
        None => {
            security::login_failed(None, &normalized);
            Err(AppError::Authentication)
        }
    }
}

fn touch_last_login(db: &PgPool, account_id: Uuid) {
    let db = db.clone();
    tokio::spawn(async move {
        if let Err(err) = Account::touch_last_login(&db, account_id).await {
            warn!(error = %err, %account_id, "last_login_at update failed");
        }
    });
}

/// A freshly issued session: the raw token (handed to the transport layer
/// exactly once) and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Sign a session token for the account and persist the matching record.
pub async fn issue_session(
    db: &PgPool,
    keys: &SessionKeys,
    account: &Account,
    org_slug: &str,
    remember_me: bool,
    client_ip: &str,
    user_agent: Option<&str>,
) -> Result<IssuedSession, AppError> {
    let (token, claims) = keys.sign(account, org_slug, remember_me)?;
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp as i64)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    SessionRecord::insert(
        db,
        NewSessionRecord {
            id: claims.sid,
            account_id: account.id,
            organization_id: account.organization_id,
            token_hash: token_hash(&token),
            expires_at,
            client_ip,
            user_agent,
        },
    )
    .await?;

    debug!(account_id = %account.id, session_id = %claims.sid, "session issued");
    Ok(IssuedSession { token, expires_at })
}

/// Token verification plus the revocation lookup. A structurally valid
/// token whose record is gone or revoked is rejected; a store fault also
/// rejects (fail closed). The caller cannot tell which path failed.
pub async fn verify_revocable(
    db: &PgPool,
    keys: &SessionKeys,
    token: &str,
) -> Result<SessionClaims, AppError> {
    let claims = keys.verify(token)?;
    match SessionRecord::find_active_by_hash(db, &token_hash(token)).await {
        Ok(Some(_)) => Ok(claims),
        Ok(None) => Err(AppError::Authentication),
        Err(err) => {
            warn!(error = %err, "session record lookup failed; denying");
            Err(AppError::Authentication)
        }
    }
}

/// Revoke the session behind a raw token (logout).
pub async fn revoke_session(db: &PgPool, token: &str) -> Result<u64, AppError> {
    let revoked = SessionRecord::revoke_by_hash(db, &token_hash(token)).await?;
    Ok(revoked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Admin@Acme.COM "), "admin@acme.com");
        assert_eq!(normalize_email("user@example.com"), "user@example.com");
    }
}
