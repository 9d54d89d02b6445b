use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo_types::Account;

impl Account {
    /// Find an account by tenant and normalized email.
    pub async fn find_by_org_and_email(
        db: &PgPool,
        organization_id: Uuid,
        email_normalized: &str,
    ) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, organization_id, email, email_normalized, password_hash, role,
                   last_login_at, created_at
            FROM accounts
            WHERE organization_id = $1 AND email_normalized = $2
            "#,
        )
        .bind(organization_id)
        .bind(email_normalized)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    /// All accounts registered under a normalized email, across tenants.
    /// The same email may exist in multiple organizations as distinct
    /// accounts.
    pub async fn find_all_by_email(
        db: &PgPool,
        email_normalized: &str,
    ) -> anyhow::Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, organization_id, email, email_normalized, password_hash, role,
                   last_login_at, created_at
            FROM accounts
            WHERE email_normalized = $1
            "#,
        )
        .bind(email_normalized)
        .fetch_all(db)
        .await?;
        Ok(accounts)
    }

    /// Record a successful login. Called best-effort off the request path.
    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE accounts SET last_login_at = $1 WHERE id = $2")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Create or update the account provisioned by an invite. Runs inside
    /// the invite-accept transaction so the account and the accepted
    /// marker commit together. `organization_id` is never updated: an
    /// account cannot move between tenants.
    pub async fn upsert_invited(
        conn: &mut PgConnection,
        organization_id: Uuid,
        email: &str,
        email_normalized: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, organization_id, email, email_normalized, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (organization_id, email_normalized)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role
            RETURNING id, organization_id, email, email_normalized, password_hash, role,
                      last_login_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(email)
        .bind(email_normalized)
        .bind(password_hash)
        .bind(role)
        .fetch_one(conn)
        .await?;
        Ok(account)
    }
}
