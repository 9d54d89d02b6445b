//! Security-audit events.
//!
//! Emitted under the `security` tracing target so they can be routed to a
//! monitoring pipeline separately from ordinary error logs.

use uuid::Uuid;

/// A valid token for one organization was presented at a route resolved to
/// another. The request is rejected upstream; this records the probe.
pub fn cross_tenant_token(tenant_slug: &str, tenant_id: Uuid, claimed_org: Uuid, account_id: Uuid) {
    tracing::warn!(
        target: "security",
        event = "cross_tenant_token",
        %tenant_slug,
        %tenant_id,
        %claimed_org,
        %account_id,
        "token presented for the wrong organization"
    );
}

/// A login attempt was denied by the rate limiter.
pub fn login_rate_limited(key: &str, client_ip: &str) {
    tracing::warn!(
        target: "security",
        event = "login_rate_limited",
        key,
        client_ip,
        "login attempts throttled"
    );
}

/// A login failed credential verification. Repeated hits on the same
/// account are the signal monitoring cares about.
pub fn login_failed(organization_id: Option<Uuid>, email: &str) {
    tracing::warn!(
        target: "security",
        event = "login_failed",
        ?organization_id,
        email,
        "credential verification failed"
    );
}
