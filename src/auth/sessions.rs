use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted record of an issued session. Holds a one-way hash of the
/// token, never the token itself, and exists for audit and revocation
/// lookups only; authorization rests on the token's signature and claims.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
    pub client_ip: String,
    pub user_agent: Option<String>,
}

pub struct NewSessionRecord<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub token_hash: String,
    pub expires_at: OffsetDateTime,
    pub client_ip: &'a str,
    pub user_agent: Option<&'a str>,
}

impl SessionRecord {
    pub async fn insert(db: &PgPool, new: NewSessionRecord<'_>) -> anyhow::Result<SessionRecord> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO session_records
                (id, account_id, organization_id, token_hash, expires_at, client_ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, account_id, organization_id, token_hash, created_at, expires_at,
                      revoked_at, client_ip, user_agent
            "#,
        )
        .bind(new.id)
        .bind(new.account_id)
        .bind(new.organization_id)
        .bind(new.token_hash)
        .bind(new.expires_at)
        .bind(new.client_ip)
        .bind(new.user_agent)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    /// Look up a live (not revoked) record by token hash.
    pub async fn find_active_by_hash(
        db: &PgPool,
        token_hash: &str,
    ) -> anyhow::Result<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT id, account_id, organization_id, token_hash, created_at, expires_at,
                   revoked_at, client_ip, user_agent
            FROM session_records
            WHERE token_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Mark the record for a token as revoked (logout, administrative
    /// kill). Returns how many records were affected.
    pub async fn revoke_by_hash(db: &PgPool, token_hash: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE session_records
            SET revoked_at = $1
            WHERE token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .bind(token_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete records past their expiry. Best-effort housekeeping.
    pub async fn prune_expired(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM session_records WHERE expires_at < $1")
            .bind(OffsetDateTime::now_utc())
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
