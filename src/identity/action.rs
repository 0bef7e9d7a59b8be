//! Links from verification and password-reset emails land on the auth-action view as
//! `?mode=<mode>&oobCode=<code>[&continueUrl=<url>]`.

use reqwest::Url;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    VerifyEmail,
    ResetPassword,
    RecoverEmail,
}

impl ActionMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verifyEmail" => Some(ActionMode::VerifyEmail),
            "resetPassword" => Some(ActionMode::ResetPassword),
            "recoverEmail" => Some(ActionMode::RecoverEmail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub mode: ActionMode,
    pub oob_code: String,
    pub continue_url: Option<String>,
}

impl ActionRequest {
    /// Accepts an absolute link or a site-relative one such as `/auth/action?mode=...`.
    pub fn from_link(link: &str) -> AppResult<Self> {
        let url = match Url::parse(link) {
            Ok(u) => u,
            Err(_) => Url::parse("http://localhost/")
                .and_then(|base| base.join(link))
                .map_err(|e| AppError::input("invalid_action_link".to_string(), format!("{}: {}", link, e)))?,
        };
        let mut mode = None;
        let mut oob_code = None;
        let mut continue_url = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "mode" => mode = Some(v.into_owned()),
                "oobCode" => oob_code = Some(v.into_owned()),
                "continueUrl" => continue_url = Some(v.into_owned()),
                _ => {}
            }
        }
        let mode = mode
            .as_deref()
            .and_then(ActionMode::parse)
            .ok_or_else(|| AppError::input("invalid_action_link", "missing or unknown mode"))?;
        let oob_code = oob_code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::input("invalid_action_link", "missing oobCode"))?;
        Ok(Self { mode, oob_code, continue_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_and_relative_links() {
        let r = ActionRequest::from_link("https://bilo.fi/auth/action?mode=resetPassword&oobCode=abc&continueUrl=https%3A%2F%2Fbilo.fi%2Flogin").unwrap();
        assert_eq!(r.mode, ActionMode::ResetPassword);
        assert_eq!(r.oob_code, "abc");
        assert_eq!(r.continue_url.as_deref(), Some("https://bilo.fi/login"));

        let r = ActionRequest::from_link("/auth/action?oobCode=xyz&mode=verifyEmail").unwrap();
        assert_eq!(r.mode, ActionMode::VerifyEmail);
        assert_eq!(r.continue_url, None);
    }

    #[test]
    fn rejects_incomplete_links() {
        assert!(ActionRequest::from_link("/auth/action?mode=verifyEmail").is_err());
        assert!(ActionRequest::from_link("/auth/action?mode=signIn&oobCode=abc").is_err());
        assert!(ActionRequest::from_link("/auth/action?mode=verifyEmail&oobCode=").is_err());
    }
}
