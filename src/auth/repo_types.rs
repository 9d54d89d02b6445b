use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;

/// Tenant-scoped admin account. `organization_id` is immutable after
/// creation; `email_normalized` is unique within an organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub email_normalized: String, // lowercase, used for lookup/uniqueness
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
