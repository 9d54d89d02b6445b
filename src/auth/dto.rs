use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo_types::Account;
use crate::orgs::repo_types::OrgSummary;

/// Request body for login, tenant-scoped or global.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Public part of an account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Response for a tenant login; the session itself travels in the cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub account: PublicAccount,
    pub organization: OrgSummary,
}

/// Response for the global login surface. Either a completed login or a
/// list of candidate organizations for the caller to disambiguate.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GlobalLoginResponse {
    LoggedIn {
        account: PublicAccount,
        organization: OrgSummary,
    },
    NeedsOrganization {
        organizations: Vec<OrgSummary>,
    },
}

/// Identity echo for `GET /orgs/:slug/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_account_serialization() {
        let response = PublicAccount {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Viewer,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"viewer\""));
    }

    #[test]
    fn global_login_response_shapes_differ() {
        let needs = GlobalLoginResponse::NeedsOrganization {
            organizations: vec![OrgSummary {
                id: Uuid::new_v4(),
                slug: "acme".into(),
                name: "Acme".into(),
            }],
        };
        let json = serde_json::to_string(&needs).unwrap();
        assert!(json.contains("organizations"));
        assert!(!json.contains("account"));
    }

    #[test]
    fn remember_me_defaults_to_false() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"pw"}"#).unwrap();
        assert!(!req.remember_me);
    }
}
