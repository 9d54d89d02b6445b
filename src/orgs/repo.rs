use sqlx::PgPool;
use uuid::Uuid;

use crate::orgs::repo_types::{OrgSummary, Organization};

impl Organization {
    /// Find an organization by its slug.
    pub async fn find_by_slug(db: &PgPool, slug: &str) -> anyhow::Result<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, slug, name, created_at
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(db)
        .await?;
        Ok(org)
    }

    /// Find an organization by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, slug, name, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(org)
    }

    /// Summaries for a set of organizations, for login disambiguation.
    pub async fn summaries_by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<OrgSummary>> {
        let orgs = sqlx::query_as::<_, OrgSummary>(
            r#"
            SELECT id, slug, name
            FROM organizations
            WHERE id = ANY($1)
            ORDER BY slug
            "#,
        )
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(orgs)
    }
}
