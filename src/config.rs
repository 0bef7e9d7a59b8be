//!
//! Runtime configuration
//! ---------------------
//! Settings come from environment variables with production defaults. The email API key
//! has no default and must be supplied by the deployment.

use std::env;

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PRODUCTION_HOST: &str = "bilo.fi";
pub const DEFAULT_CANONICAL_ORIGIN: &str = "https://bilo.fi";
pub const DEFAULT_AUTH_DOMAIN_FALLBACK: &str = "b2c-car-4c084.firebaseapp.com";
pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.eu.mailgun.net/v3";
pub const DEFAULT_MAILGUN_DOMAIN: &str = "bilo.fi";
pub const DEFAULT_MAIL_FROM: &str = "Bilo <noreplay@bilo.fi>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Hostname that identifies the production deployment.
    pub production_host: String,
    /// Origin used for every redirect URL when running on the production host.
    pub canonical_origin: String,
    /// Identity provider auth domain for non-production hosts.
    pub auth_domain_fallback: String,
    pub language: String,
    pub mailgun_api_base: String,
    pub mailgun_domain: String,
    pub mailgun_api_key: Option<String>,
    pub mail_from: String,
    pub http_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            production_host: DEFAULT_PRODUCTION_HOST.to_string(),
            canonical_origin: DEFAULT_CANONICAL_ORIGIN.to_string(),
            auth_domain_fallback: DEFAULT_AUTH_DOMAIN_FALLBACK.to_string(),
            language: "fi".to_string(),
            mailgun_api_base: DEFAULT_MAILGUN_API_BASE.to_string(),
            mailgun_domain: DEFAULT_MAILGUN_DOMAIN.to_string(),
            mailgun_api_key: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            http_timeout_secs: None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_u64_env(name: &str) -> Option<u64> {
    env_string(name).and_then(|v| v.parse::<u64>().ok())
}

impl AppConfig {
    /// Build from `BILO_*` / `MAILGUN_*` variables, falling back to defaults per field.
    pub fn from_env() -> Self {
        let d = AppConfig::default();
        Self {
            production_host: env_string("BILO_PRODUCTION_HOST").unwrap_or(d.production_host),
            canonical_origin: env_string("BILO_CANONICAL_ORIGIN").unwrap_or(d.canonical_origin),
            auth_domain_fallback: env_string("BILO_AUTH_DOMAIN_FALLBACK").unwrap_or(d.auth_domain_fallback),
            language: env_string("BILO_LANGUAGE").unwrap_or(d.language),
            mailgun_api_base: env_string("MAILGUN_API_BASE").unwrap_or(d.mailgun_api_base),
            mailgun_domain: env_string("MAILGUN_DOMAIN").unwrap_or(d.mailgun_domain),
            mailgun_api_key: env_string("MAILGUN_API_KEY"),
            mail_from: env_string("BILO_MAIL_FROM").unwrap_or(d.mail_from),
            http_timeout_secs: parse_u64_env("BILO_HTTP_TIMEOUT_SECS"),
        }
    }

    pub fn mailgun_endpoint(&self) -> String {
        format!("{}/{}/messages", self.mailgun_api_base.trim_end_matches('/'), self.mailgun_domain)
    }

    pub fn is_production(&self, host: &HostEnvironment) -> bool {
        host.hostname.eq_ignore_ascii_case(&self.production_host)
    }

    /// The production site authenticates on its own domain; every other host uses the provider default.
    pub fn auth_domain(&self, host: &HostEnvironment) -> &str {
        if self.is_production(host) { &self.production_host } else { &self.auth_domain_fallback }
    }
}

/// Where the client is running, as the browser location would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub hostname: String,
    /// Scheme, host and port without a trailing slash, e.g. `http://localhost:5173`.
    pub origin: String,
}

impl HostEnvironment {
    pub fn from_origin(origin: &str) -> AppResult<Self> {
        let url = Url::parse(origin)
            .map_err(|e| AppError::input("invalid_origin".to_string(), format!("{}: {}", origin, e)))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| AppError::input("invalid_origin".to_string(), format!("{} has no host", origin)))?
            .to_string();
        let origin = url.origin().ascii_serialization();
        Ok(Self { hostname, origin })
    }

    pub fn production(config: &AppConfig) -> Self {
        Self { hostname: config.production_host.clone(), origin: config.canonical_origin.clone() }
    }
}
