use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::invites::repo_types::InviteToken;

/// Request body for issuing an invite.
#[derive(Debug, Deserialize)]
pub struct IssueInviteRequest {
    pub email: String,
    pub role: Role,
    pub ttl_days: Option<i64>,
}

/// Response to the issuer. The only place the raw token leaves the core;
/// delivery to the invitee is the caller's concern.
#[derive(Debug, Serialize)]
pub struct InviteIssued {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<InviteToken> for InviteIssued {
    fn from(invite: InviteToken) -> Self {
        Self {
            id: invite.id,
            email: invite.email,
            role: invite.role,
            token: invite.token,
            expires_at: invite.expires_at,
        }
    }
}

/// What `peek` reveals: just enough to pre-fill the accept form.
#[derive(Debug, Serialize)]
pub struct InvitePeek {
    pub email: String,
    pub role: Role,
}

/// Request body for accepting an invite.
#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_exposes_email_and_role_only() {
        let peek = InvitePeek {
            email: "new@acme.com".into(),
            role: Role::Admin,
        };
        let json = serde_json::to_string(&peek).unwrap();
        assert_eq!(json, r#"{"email":"new@acme.com","role":"admin"}"#);
    }

    #[test]
    fn issue_request_ttl_is_optional() {
        let req: IssueInviteRequest =
            serde_json::from_str(r#"{"email":"new@acme.com","role":"viewer"}"#).unwrap();
        assert!(req.ttl_days.is_none());
        assert_eq!(req.role, Role::Viewer);
    }
}
