use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub(crate) mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Invite routes, mounted under `/orgs/:slug`. Issue is protected;
/// peek and accept are public within the tenant.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invites", post(handlers::issue))
        .route("/invites/:token", get(handlers::peek))
        .route("/invites/accept", post(handlers::accept))
}
