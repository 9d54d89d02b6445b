use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::invites::repo_types::InviteToken;

impl InviteToken {
    pub async fn create(
        db: &PgPool,
        organization_id: Uuid,
        email: &str,
        token: &str,
        role: Role,
        created_by: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<InviteToken> {
        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            INSERT INTO invite_tokens (id, organization_id, email, token, role, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, organization_id, email, token, role, created_by, created_at,
                      expires_at, accepted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(email)
        .bind(token)
        .bind(role)
        .bind(created_by)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(invite)
    }

    /// Find an invite by its secret token, scoped to the tenant resolved
    /// from the path.
    pub async fn find_by_token(
        db: &PgPool,
        organization_id: Uuid,
        token: &str,
    ) -> anyhow::Result<Option<InviteToken>> {
        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT id, organization_id, email, token, role, created_by, created_at,
                   expires_at, accepted_at
            FROM invite_tokens
            WHERE organization_id = $1 AND token = $2
            "#,
        )
        .bind(organization_id)
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(invite)
    }

    /// Atomically claim the invite: set `accepted_at` if and only if it is
    /// still null and the invite has not expired. At most one concurrent
    /// caller sees `true`; everyone else lost the race or was late.
    pub async fn try_consume(
        conn: &mut PgConnection,
        id: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invite_tokens
            SET accepted_at = $1
            WHERE id = $2 AND accepted_at IS NULL AND expires_at > $1
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
