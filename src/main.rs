use std::time::Duration;

mod app;
mod auth;
mod config;
mod error;
mod invites;
mod orgs;
mod ratelimit;
mod security;
mod state;

use crate::auth::sessions::SessionRecord;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "talenthub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // Housekeeping: drop expired rate-limit windows and session records.
    {
        let limiter = app_state.limiter.clone();
        let db = app_state.db.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                let removed = limiter.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "rate limit entries swept");
                }
                if let Err(e) = SessionRecord::prune_expired(&db).await {
                    tracing::warn!(error = %e, "session record pruning failed");
                }
            }
        });
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
