use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod claims;
pub(crate) mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod sessions;
pub mod token;

/// Tenant-scoped authentication routes, mounted under `/orgs/:slug`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
}

/// The global login surface, mounted at the application root.
pub fn global_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(handlers::global_login))
}
