use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::password::hash_password_blocking;
use crate::auth::repo_types::Account;
use crate::auth::services::{
    is_valid_email, issue_session, normalize_email, IssuedSession,
};
use crate::auth::token::SessionKeys;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::invites::repo_types::InviteToken;
use crate::orgs::repo_types::Organization;

/// Derived invite state. Expiry wins over acceptance: a read after
/// `expires_at` reports expired regardless of `accepted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
}

pub fn invite_status(invite: &InviteToken, now: OffsetDateTime) -> InviteStatus {
    if invite.expires_at <= now {
        InviteStatus::Expired
    } else if invite.accepted_at.is_some() {
        InviteStatus::Accepted
    } else {
        InviteStatus::Pending
    }
}

fn status_error(status: InviteStatus) -> Option<AppError> {
    match status {
        InviteStatus::Pending => None,
        InviteStatus::Accepted => Some(AppError::Conflict("invite already accepted".into())),
        InviteStatus::Expired => Some(AppError::Validation("invite token expired".into())),
    }
}

fn generate_invite_token() -> String {
    use base64::Engine;
    use rand::Rng;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Create an invite for an email within the organization.
pub async fn issue(
    db: &PgPool,
    config: &AppConfig,
    org: &Organization,
    email: &str,
    role: Role,
    ttl_days: Option<i64>,
    created_by: Uuid,
) -> Result<InviteToken, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    let ttl_days = ttl_days.unwrap_or(config.invite.ttl_days);
    if ttl_days <= 0 {
        return Err(AppError::Validation("invite ttl must be positive".into()));
    }

    let token = generate_invite_token();
    let expires_at = OffsetDateTime::now_utc() + time::Duration::days(ttl_days);
    let invite =
        InviteToken::create(db, org.id, &email, &token, role, created_by, expires_at).await?;

    info!(
        organization_id = %org.id,
        invite_id = %invite.id,
        %created_by,
        "invite issued"
    );
    Ok(invite)
}

/// Read-only validity check. Safe to call repeatedly; mutates nothing.
pub async fn peek(
    db: &PgPool,
    organization_id: Uuid,
    token: &str,
) -> Result<InviteToken, AppError> {
    let invite = InviteToken::find_by_token(db, organization_id, token)
        .await?
        .ok_or(AppError::NotFound("invite"))?;
    if let Some(err) = status_error(invite_status(&invite, OffsetDateTime::now_utc())) {
        return Err(err);
    }
    Ok(invite)
}

/// Consume an invite: set the password, provision the account, and log the
/// new account in.
///
/// The accepted marker and the account upsert commit in one transaction,
/// so a failure later (session issuance) can never leave the invite
/// consumed without a usable account. At most one concurrent accept for
/// the same token succeeds.
pub async fn accept(
    db: &PgPool,
    keys: &SessionKeys,
    config: &AppConfig,
    org: &Organization,
    token: &str,
    password: &str,
    client_ip: &str,
    user_agent: Option<&str>,
) -> Result<(Account, IssuedSession), AppError> {
    // Policy check first: nothing is read or written for a bad password.
    if password.len() < config.password_min_length {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            config.password_min_length
        )));
    }

    let invite = peek(db, org.id, token).await?;
    let password_hash = hash_password_blocking(password.to_string()).await?;
    let email_normalized = normalize_email(&invite.email);

    let mut tx = db.begin().await?;
    let now = OffsetDateTime::now_utc();
    let claimed = InviteToken::try_consume(&mut tx, invite.id, now).await?;
    if !claimed {
        // Lost the race, or crossed the expiry boundary since the peek.
        tx.rollback().await.ok();
        let fresh = InviteToken::find_by_token(db, org.id, token)
            .await?
            .ok_or(AppError::NotFound("invite"))?;
        let err = status_error(invite_status(&fresh, OffsetDateTime::now_utc()))
            .unwrap_or_else(|| AppError::Conflict("invite already accepted".into()));
        return Err(err);
    }

    let account = Account::upsert_invited(
        &mut tx,
        org.id,
        &invite.email,
        &email_normalized,
        &password_hash,
        invite.role,
    )
    .await?;
    tx.commit().await?;

    info!(
        organization_id = %org.id,
        invite_id = %invite.id,
        account_id = %account.id,
        "invite accepted"
    );

    // Auto-login. The invite is already consumed and the account usable;
    // a failure here surfaces as an error the caller can retry via login.
    let issued = issue_session(db, keys, &account, &org.slug, false, client_ip, user_agent).await?;
    Ok((account, issued))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_invite(expires_at: OffsetDateTime, accepted_at: Option<OffsetDateTime>) -> InviteToken {
        InviteToken {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            email: "new@acme.com".into(),
            token: generate_invite_token(),
            role: Role::Admin,
            created_by: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            accepted_at,
        }
    }

    #[test]
    fn pending_within_window() {
        let now = OffsetDateTime::now_utc();
        let invite = make_invite(now + Duration::from_secs(3600), None);
        assert_eq!(invite_status(&invite, now), InviteStatus::Pending);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = OffsetDateTime::now_utc();
        let invite = make_invite(now, None);
        assert_eq!(invite_status(&invite, now), InviteStatus::Expired);
    }

    #[test]
    fn expired_wins_over_accepted() {
        let now = OffsetDateTime::now_utc();
        let invite = make_invite(now - Duration::from_secs(60), Some(now - Duration::from_secs(120)));
        assert_eq!(invite_status(&invite, now), InviteStatus::Expired);
    }

    #[test]
    fn accepted_when_unexpired() {
        let now = OffsetDateTime::now_utc();
        let invite = make_invite(now + Duration::from_secs(3600), Some(now));
        assert_eq!(invite_status(&invite, now), InviteStatus::Accepted);
    }

    #[test]
    fn status_errors_map_to_taxonomy() {
        assert!(status_error(InviteStatus::Pending).is_none());
        assert!(matches!(
            status_error(InviteStatus::Accepted),
            Some(AppError::Conflict(_))
        ));
        assert!(matches!(
            status_error(InviteStatus::Expired),
            Some(AppError::Validation(_))
        ));
    }

    #[test]
    fn generated_tokens_are_long_url_safe_and_unique() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_ne!(a, b);
        // 32 random bytes, unpadded url-safe base64
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
