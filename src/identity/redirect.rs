//! Continue URLs embedded in verification and password-reset emails.
//! On the production host the links always point at the canonical domain; anywhere else
//! they are built from the page's own origin so local and preview deployments work.

use serde::Serialize;

use crate::config::{AppConfig, HostEnvironment};

pub const EMAIL_VERIFIED_PATH: &str = "/email-verified";
pub const AUTH_ACTION_PATH: &str = "/auth/action";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCodeSettings {
    pub url: String,
    pub handle_code_in_app: bool,
}

fn continue_url(config: &AppConfig, host: &HostEnvironment, path: &str) -> String {
    let base = if config.is_production(host) { &config.canonical_origin } else { &host.origin };
    format!("{}{}", base.trim_end_matches('/'), path)
}

pub fn verification_settings(config: &AppConfig, host: &HostEnvironment) -> ActionCodeSettings {
    ActionCodeSettings { url: continue_url(config, host, EMAIL_VERIFIED_PATH), handle_code_in_app: true }
}

pub fn password_reset_settings(config: &AppConfig, host: &HostEnvironment) -> ActionCodeSettings {
    ActionCodeSettings { url: continue_url(config, host, AUTH_ACTION_PATH), handle_code_in_app: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_host_uses_canonical_domain() {
        let cfg = AppConfig::default();
        // The production hostname served over a different origin string still maps to the canonical URL.
        let host = HostEnvironment { hostname: "bilo.fi".into(), origin: "http://bilo.fi:8080".into() };
        assert_eq!(verification_settings(&cfg, &host).url, "https://bilo.fi/email-verified");
        assert_eq!(password_reset_settings(&cfg, &host).url, "https://bilo.fi/auth/action");
    }

    #[test]
    fn other_hosts_use_current_origin() {
        let cfg = AppConfig::default();
        let host = HostEnvironment::from_origin("http://localhost:5173").unwrap();
        assert_eq!(verification_settings(&cfg, &host).url, "http://localhost:5173/email-verified");
        assert_eq!(password_reset_settings(&cfg, &host).url, "http://localhost:5173/auth/action");

        let preview = HostEnvironment::from_origin("https://preview.bilo.fi").unwrap();
        assert_eq!(verification_settings(&cfg, &preview).url, "https://preview.bilo.fi/email-verified");
        assert!(verification_settings(&cfg, &preview).handle_code_in_app);
    }
}
