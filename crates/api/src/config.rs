use std::time::Duration;

use pagewright_content::ContentConfig;
use pagewright_core::forms::ContactFormConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Absolute site origin used for default canonical URLs.
    pub site_url: String,
    /// Editor sessions idle this long are closed (default: 30 minutes).
    pub session_idle_timeout: Duration,
    /// Synchronization layer tunables (SEO freshness window, notice buffer).
    pub content: ContentConfig,
    /// Optional contact form fields that are enabled.
    pub contact_form: ContactFormConfig,
    /// Verification settings for tokens from the hosted auth provider.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SITE_URL`             | `http://localhost:3000`    |
    /// | `SEO_CACHE_TTL_SECS`   | `300`                      |
    /// | `SESSION_IDLE_SECS`    | `1800`                     |
    /// | `JWT_SECRET`           | required                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let site_url = std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        let seo_ttl_secs: u64 = std::env::var("SEO_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SEO_CACHE_TTL_SECS must be a valid u64");

        let session_idle_secs: u64 = std::env::var("SESSION_IDLE_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("SESSION_IDLE_SECS must be a valid u64");

        let content = ContentConfig {
            seo_ttl: Duration::from_secs(seo_ttl_secs),
            ..Default::default()
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            site_url,
            session_idle_timeout: Duration::from_secs(session_idle_secs),
            content,
            contact_form: ContactFormConfig::default(),
            jwt: JwtConfig::from_env(),
        }
    }
}
