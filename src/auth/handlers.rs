use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, FromRef, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{GlobalLoginResponse, LoginRequest, LoginResponse, MeResponse, PublicAccount},
        services::{
            is_valid_email, issue_session, normalize_email, revoke_session, verify_credentials,
            verify_across_organizations, GlobalLogin, IssuedSession,
        },
        token::SessionKeys,
    },
    error::AppError,
    orgs::guard::{extract_token, AuthContext, CurrentTenant, SESSION_COOKIE},
    orgs::repo_types::{OrgSummary, Organization},
    ratelimit::{client_ip, login_key},
    security,
    state::AppState,
};

pub(crate) fn session_cookie(issued: &IssuedSession, secure: bool) -> Cookie<'static> {
    let max_age = issued.expires_at - OffsetDateTime::now_utc();
    Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Rate-limit gate shared by both login surfaces. Denials emit a security
/// event in addition to the 429.
async fn check_login_rate(state: &AppState, ip: &str, email: &str) -> Result<(), AppError> {
    let rl = &state.config.rate_limit;
    let key = login_key(ip, email);
    let decision = state
        .limiter
        .check(
            &key,
            rl.login_max_attempts,
            Duration::from_secs(rl.login_window_seconds),
        )
        .await;
    if !decision.allowed {
        security::login_rate_limited(&key, ip);
        return Err(AppError::RateLimited(decision));
    }
    Ok(())
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    CurrentTenant(org): CurrentTenant,
    headers: HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    payload.email = normalize_email(&payload.email);
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("invalid email".into()));
    }

    let ip = client_ip(
        state.config.rate_limit.trust_proxy,
        &headers,
        connect.map(|c| c.0),
    );
    check_login_rate(&state, &ip, &payload.email).await?;

    let account = verify_credentials(&state.db, org.id, &payload.email, &payload.password).await?;

    let keys = SessionKeys::from_ref(&state);
    let issued = issue_session(
        &state.db,
        &keys,
        &account,
        &org.slug,
        payload.remember_me,
        &ip,
        user_agent(&headers),
    )
    .await?;

    info!(account_id = %account.id, organization_id = %org.id, "login succeeded");
    let jar = jar.add(session_cookie(&issued, state.config.session.cookie_secure));
    Ok((
        jar,
        Json(LoginResponse {
            account: PublicAccount::from(&account),
            organization: OrgSummary::from(&org),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn global_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<GlobalLoginResponse>), AppError> {
    payload.email = normalize_email(&payload.email);
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("invalid email".into()));
    }

    let ip = client_ip(
        state.config.rate_limit.trust_proxy,
        &headers,
        connect.map(|c| c.0),
    );
    check_login_rate(&state, &ip, &payload.email).await?;

    match verify_across_organizations(&state.db, &payload.email, &payload.password).await? {
        GlobalLogin::Single(account) => {
            let org = Organization::find_by_id(&state.db, account.organization_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("account references missing organization"))?;

            let keys = SessionKeys::from_ref(&state);
            let issued = issue_session(
                &state.db,
                &keys,
                &account,
                &org.slug,
                payload.remember_me,
                &ip,
                user_agent(&headers),
            )
            .await?;

            info!(account_id = %account.id, organization_id = %org.id, "global login succeeded");
            let jar = jar.add(session_cookie(&issued, state.config.session.cookie_secure));
            Ok((
                jar,
                Json(GlobalLoginResponse::LoggedIn {
                    account: PublicAccount::from(&account),
                    organization: OrgSummary::from(&org),
                }),
            ))
        }
        GlobalLogin::Ambiguous(organizations) => {
            info!(candidates = organizations.len(), "global login needs organization");
            Ok((
                jar,
                Json(GlobalLoginResponse::NeedsOrganization { organizations }),
            ))
        }
    }
}

/// Revokes the presented session, if any, and clears the cookie. Always
/// succeeds from the caller's point of view.
#[instrument(skip(state, jar, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(token) = extract_token(&headers) {
        match revoke_session(&state.db, &token).await {
            Ok(revoked) if revoked > 0 => info!("session revoked"),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "logout revocation failed"),
        }
    }
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn me(ctx: AuthContext) -> Json<MeResponse> {
    Json(MeResponse {
        account_id: ctx.account_id,
        organization_id: ctx.organization_id,
        email: ctx.email,
        role: ctx.role,
    })
}
