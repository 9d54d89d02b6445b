use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Path, Request, State},
    http::{request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::services::verify_revocable;
use crate::auth::token::SessionKeys;
use crate::error::AppError;
use crate::orgs::repo_types::Organization;
use crate::security;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// The tenant resolved from the request path, attached to every request
/// that passes the guard.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Organization);

/// Verified identity forwarded to downstream handlers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    pub fn require_manage_members(&self) -> Result<(), AppError> {
        if self.role.can_manage_members() {
            Ok(())
        } else {
            Err(AppError::Authorization)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteClass {
    Public,
    Protected,
}

// Public-within-tenant surface: login, logout, password-reset request,
// invite peek and accept. Everything else under the tenant requires a
// verified session.
fn classify(method: &Method, rest: &str) -> RouteClass {
    let public = match (method.as_str(), rest) {
        ("POST", "auth/login")
        | ("POST", "auth/logout")
        | ("POST", "auth/password-reset")
        | ("POST", "invites/accept") => true,
        ("GET", rest) => matches!(
            rest.strip_prefix("invites/"),
            Some(token) if !token.is_empty() && !token.contains('/')
        ),
        _ => false,
    };
    if public {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

fn tenant_path_rest<'a>(path: &'a str, slug: &str) -> &'a str {
    path.strip_prefix("/orgs/")
        .and_then(|p| p.strip_prefix(slug))
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or("")
}

/// Pull the session token off the designated transports: the session
/// cookie first, then an Authorization bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.to_string())
}

/// Per-request gatekeeper for tenant-scoped paths.
///
/// Resolves the tenant from the path slug, verifies the session for
/// protected routes, and enforces that the token's tenant claim matches the
/// resolved tenant. A mismatch is always rejected, however valid the token
/// is otherwise, and is recorded as a security event.
pub async fn tenant_guard(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let slug = params
        .get("slug")
        .cloned()
        .ok_or(AppError::NotFound("organization"))?;

    let org = Organization::find_by_slug(&state.db, &slug)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound("organization"))?;

    let rest = tenant_path_rest(req.uri().path(), &slug).to_string();
    let class = classify(req.method(), &rest);

    req.extensions_mut().insert(CurrentTenant(org.clone()));

    if class == RouteClass::Protected {
        let token = extract_token(req.headers()).ok_or(AppError::Authentication)?;
        let keys = SessionKeys::from_ref(&state);
        let claims = verify_revocable(&state.db, &keys, &token).await?;

        if claims.org != org.id {
            security::cross_tenant_token(&org.slug, org.id, claims.org, claims.sub);
            return Err(AppError::Authentication);
        }

        req.extensions_mut().insert(AuthContext {
            account_id: claims.sub,
            organization_id: claims.org,
            email: claims.email,
            role: claims.role,
        });
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Authentication)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentTenant>()
            .cloned()
            .ok_or(AppError::NotFound("organization"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn public_routes_are_classified_public() {
        assert_eq!(classify(&Method::POST, "auth/login"), RouteClass::Public);
        assert_eq!(classify(&Method::POST, "auth/logout"), RouteClass::Public);
        assert_eq!(
            classify(&Method::POST, "auth/password-reset"),
            RouteClass::Public
        );
        assert_eq!(
            classify(&Method::POST, "invites/accept"),
            RouteClass::Public
        );
        assert_eq!(
            classify(&Method::GET, "invites/abc123"),
            RouteClass::Public
        );
    }

    #[test]
    fn everything_else_is_protected() {
        assert_eq!(classify(&Method::GET, "auth/me"), RouteClass::Protected);
        assert_eq!(classify(&Method::POST, "invites"), RouteClass::Protected);
        assert_eq!(classify(&Method::GET, "invites"), RouteClass::Protected);
        assert_eq!(classify(&Method::GET, ""), RouteClass::Protected);
        assert_eq!(
            classify(&Method::GET, "invites/abc/extra"),
            RouteClass::Protected
        );
        // Method matters: a GET to the login path is not the login route.
        assert_eq!(classify(&Method::GET, "auth/login"), RouteClass::Protected);
    }

    #[test]
    fn rest_of_path_strips_tenant_prefix() {
        assert_eq!(
            tenant_path_rest("/orgs/acme/auth/login", "acme"),
            "auth/login"
        );
        assert_eq!(tenant_path_rest("/orgs/acme", "acme"), "");
        assert_eq!(tenant_path_rest("/health", "acme"), "");
    }

    #[test]
    fn token_comes_from_cookie_first_then_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("session=cookie-token"),
        );
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-token"));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("header-token"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
