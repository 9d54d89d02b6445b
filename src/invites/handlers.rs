use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, Path, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::{
    auth::dto::PublicAccount,
    auth::handlers::session_cookie,
    auth::token::SessionKeys,
    error::AppError,
    invites::{
        dto::{AcceptInviteRequest, InviteIssued, InvitePeek, IssueInviteRequest},
        services,
    },
    orgs::guard::{AuthContext, CurrentTenant},
    ratelimit::client_ip,
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn issue(
    State(state): State<AppState>,
    CurrentTenant(org): CurrentTenant,
    ctx: AuthContext,
    Json(payload): Json<IssueInviteRequest>,
) -> Result<Json<InviteIssued>, AppError> {
    ctx.require_manage_members()?;
    let invite = services::issue(
        &state.db,
        &state.config,
        &org,
        &payload.email,
        payload.role,
        payload.ttl_days,
        ctx.account_id,
    )
    .await?;
    Ok(Json(InviteIssued::from(invite)))
}

#[instrument(skip(state))]
pub async fn peek(
    State(state): State<AppState>,
    CurrentTenant(org): CurrentTenant,
    Path((_slug, token)): Path<(String, String)>,
) -> Result<Json<InvitePeek>, AppError> {
    let invite = services::peek(&state.db, org.id, &token).await?;
    Ok(Json(InvitePeek {
        email: invite.email,
        role: invite.role,
    }))
}

#[instrument(skip(state, jar, payload))]
pub async fn accept(
    State(state): State<AppState>,
    CurrentTenant(org): CurrentTenant,
    headers: HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Json(payload): Json<AcceptInviteRequest>,
) -> Result<(CookieJar, Json<PublicAccount>), AppError> {
    let ip = client_ip(
        state.config.rate_limit.trust_proxy,
        &headers,
        connect.map(|c| c.0),
    );
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let keys = SessionKeys::from_ref(&state);
    let (account, issued) = services::accept(
        &state.db,
        &keys,
        &state.config,
        &org,
        &payload.token,
        &payload.password,
        &ip,
        user_agent,
    )
    .await?;

    let jar = jar.add(session_cookie(&issued, state.config.session.cookie_secure));
    Ok((jar, Json(PublicAccount::from(&account))))
}
