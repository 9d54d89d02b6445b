use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Tenant record. Created by platform operators; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub slug: String, // URL-safe, immutable lookup key
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Public organization shape returned to clients (login disambiguation,
/// login responses).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrgSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

impl From<&Organization> for OrgSummary {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            slug: org.slug.clone(),
            name: org.name.clone(),
        }
    }
}
