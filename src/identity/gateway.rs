use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::action::{ActionMode, ActionRequest};
use super::principal::Identity;
use super::profile::{NewProfile, ProfileRepository, Role};
use super::provider::IdentityProvider;
use super::redirect::{password_reset_settings, verification_settings};
use super::session::SessionStore;
use crate::config::{AppConfig, HostEnvironment};
use crate::error::{AppError, AppResult};

/// Account operations on top of the identity provider and the profile store.
///
/// Nothing here retries: every failure is returned once and a retry is a new user action.
/// Session state is never written directly; the provider's auth notifications reach the
/// `SessionStore` on their own.
#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
    session: Arc<SessionStore>,
    config: Arc<AppConfig>,
    host: HostEnvironment,
}

impl IdentityGateway {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
        session: Arc<SessionStore>,
        config: Arc<AppConfig>,
        host: HostEnvironment,
    ) -> Self {
        Self { provider, profiles, session, config, host }
    }

    /// Create the identity, mail a verification link, then write the profile.
    ///
    /// A failed verification send is logged and ignored. A failed profile write returns
    /// `ProfileWriteFailure` and leaves the identity without a profile.
    pub async fn signup(&self, email: &str, password: &str, wants_vendor_role: bool) -> AppResult<Identity> {
        let identity = self
            .provider
            .create_account(email, password)
            .await
            .map_err(|e| e.into_signup_error(email))?;
        info!(target: "bilo::auth", uid = %identity.uid, vendor = wants_vendor_role, "identity created");

        let settings = verification_settings(&self.config, &self.host);
        if let Err(e) = self.provider.send_verification_email(&identity, &settings).await {
            warn!(target: "bilo::auth", uid = %identity.uid, error = %e, "verification email not sent after signup");
        }

        let fields = NewProfile {
            email: email.to_string(),
            role: if wants_vendor_role { Role::Vendor } else { Role::Customer },
            created_at: Utc::now(),
            email_verified: false,
        };
        if let Err(e) = self.profiles.create_profile(&identity.uid, fields).await {
            error!(target: "bilo::auth", uid = %identity.uid, error = %e, "profile write failed; identity left without profile");
            return Err(AppError::ProfileWriteFailure { uid: identity.uid.clone(), message: e.to_string() });
        }
        Ok(identity)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<()> {
        match self.provider.sign_in(email, password).await {
            Ok(identity) => {
                info!(target: "bilo::auth", uid = %identity.uid, "signed in");
                Ok(())
            }
            Err(e) => {
                warn!(target: "bilo::auth", error = %e, "sign-in rejected");
                Err(e.into_login_error())
            }
        }
    }

    /// Idempotent: signing out with nobody signed in succeeds.
    pub async fn logout(&self) -> AppResult<()> {
        self.provider.sign_out().await.map_err(|e| {
            warn!(target: "bilo::auth", error = %e, "sign-out failed");
            e.into_app_error()
        })?;
        info!(target: "bilo::auth", "signed out");
        Ok(())
    }

    /// Fails with `NoActiveSession` before touching the provider when nobody is signed in.
    pub async fn resend_verification_email(&self) -> AppResult<()> {
        let Some(identity) = self.session.current().identity() else {
            return Err(AppError::NoActiveSession);
        };
        let settings = verification_settings(&self.config, &self.host);
        self.provider.send_verification_email(&identity, &settings).await.map_err(|e| {
            warn!(target: "bilo::auth", uid = %identity.uid, error = %e, "verification resend failed");
            e.into_app_error()
        })
    }

    /// Reports `UserNotFound` separately from `TransientFailure`. Whether the UI reveals
    /// the difference is decided by the caller.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let settings = password_reset_settings(&self.config, &self.host);
        self.provider.send_password_reset(email, &settings).await.map_err(|e| {
            warn!(target: "bilo::auth", error = %e, "password reset request failed");
            e.into_reset_error(email)
        })
    }

    /// Complete the flow started by an emailed link.
    pub async fn apply_action(&self, request: &ActionRequest, new_password: Option<&str>) -> AppResult<()> {
        match request.mode {
            ActionMode::VerifyEmail => {
                self.provider.apply_action_code(&request.oob_code).await.map_err(|e| e.into_action_error())?;
                // Pull the fresh claim so the session reflects the verified state.
                if let Err(e) = self.provider.reload_current().await {
                    warn!(target: "bilo::auth", error = %e, "identity reload after verification failed");
                }
                info!(target: "bilo::auth", "email verified");
                Ok(())
            }
            ActionMode::ResetPassword => {
                let Some(pw) = new_password else {
                    return Err(AppError::input("missing_password", "a new password is required"));
                };
                self.provider.confirm_password_reset(&request.oob_code, pw).await.map_err(|e| e.into_action_error())?;
                info!(target: "bilo::auth", "password reset confirmed");
                Ok(())
            }
            ActionMode::RecoverEmail => Err(AppError::input("unsupported_action", "email recovery is not supported")),
        }
    }
}
