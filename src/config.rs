use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
    pub remember_me_ttl_days: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    /// Trust X-Forwarded-For / X-Real-IP for client IP detection.
    /// Only safe behind a proxy that overwrites these headers.
    pub trust_proxy: bool,
    /// Degrade to "allowed" when the counter store itself fails.
    /// Off by default: the limiter guards authentication.
    pub fail_open: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub invite: InviteConfig,
    pub password_min_length: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(8),
            remember_me_ttl_days: std::env::var("SESSION_REMEMBER_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true")
                .unwrap_or(false),
        };
        let rate_limit = RateLimitConfig {
            login_max_attempts: std::env::var("RATE_LIMIT_LOGIN_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            login_window_seconds: std::env::var("RATE_LIMIT_LOGIN_WINDOW_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(300),
            trust_proxy: std::env::var("RATE_LIMIT_TRUST_PROXY")
                .map(|v| v == "true")
                .unwrap_or(false),
            fail_open: std::env::var("RATE_LIMIT_FAIL_OPEN")
                .map(|v| v == "true")
                .unwrap_or(false),
        };
        let invite = InviteConfig {
            ttl_days: std::env::var("INVITE_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let password_min_length = std::env::var("PASSWORD_MIN_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(8);

        Ok(Self {
            database_url,
            session,
            rate_limit,
            invite,
            password_min_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_reads_defaults() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::set_var("SESSION_SECRET", "test-secret");
        std::env::remove_var("SESSION_TTL_HOURS");
        std::env::remove_var("RATE_LIMIT_LOGIN_MAX_ATTEMPTS");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.session.ttl_hours, 8);
        assert_eq!(config.session.remember_me_ttl_days, 30);
        assert_eq!(config.rate_limit.login_max_attempts, 10);
        assert_eq!(config.rate_limit.login_window_seconds, 300);
        assert!(!config.rate_limit.trust_proxy);
        assert!(!config.rate_limit.fail_open);
        assert_eq!(config.invite.ttl_days, 7);
        assert_eq!(config.password_min_length, 8);
    }
}
