//!
//! Client composition root
//! -----------------------
//! Wires the session store, identity gateway, route gate and navigator into one object
//! with an explicit start/shutdown lifecycle. This is the layer that catches every
//! `AppError`, logs it and turns it into a localized `Notice` for the view.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::{AppConfig, HostEnvironment};
use crate::error::AppError;
use crate::identity::{ActionMode, ActionRequest, Identity, IdentityGateway, IdentityProvider, ProfileRepository, RoleResolver, SessionStore};
use crate::routing::{GateState, Navigation, Navigator, Route, RouteGate};

pub const PASSWORD_RESET_SENT: &str = "Salasanan palautuslinkki lähetetty! Tarkista sähköpostisi ja seuraa ohjeita salasanan palauttamiseksi.";
pub const PASSWORD_RESET_FAILED: &str = "Virhe salasanan palautuksessa. Yritä uudelleen.";
pub const EMAIL_REQUIRED: &str = "Syötä sähköpostiosoite";
pub const VERIFICATION_RESEND_FAILED: &str = "Virhe lähetettäessä vahvistussähköpostia";
pub const VERIFICATION_SENT: &str = "Lähetetty!";
pub const ACCOUNT_NOT_READY: &str = "Käyttäjätietojasi ei löytynyt. Yritä hetken päästä uudelleen tai ota yhteyttä asiakastukeen.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message ready to show next to the control the user just used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub code: String,
    pub message: String,
}

impl Notice {
    pub fn info(code: &str, message: &str) -> Self {
        Self { kind: NoticeKind::Info, code: code.to_string(), message: message.to_string() }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self { kind: NoticeKind::Error, code: code.to_string(), message: message.to_string() }
    }

    fn from_error(action: &str, err: &AppError) -> Self {
        log_failure(action, err);
        Self::error(err.code_str(), err.user_message())
    }
}

fn log_failure(action: &str, err: &AppError) {
    error!(target: "bilo::app", action, code = err.code_str(), error = %err, "user action failed");
}

/// Banner nagging signed-in users with unverified email addresses.
#[derive(Debug, Default)]
struct BannerState {
    dismissed: bool,
    sent: bool,
}

pub struct BiloApp {
    config: Arc<AppConfig>,
    session: Arc<SessionStore>,
    gateway: IdentityGateway,
    gate: RouteGate,
    navigator: Mutex<Navigator>,
    banner: Mutex<BannerState>,
}

impl BiloApp {
    /// Build the client and subscribe the session store to the provider.
    pub fn start(
        config: AppConfig,
        host: HostEnvironment,
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        let config = Arc::new(config);
        let session = Arc::new(SessionStore::new());
        session.init(provider.as_ref());
        let gateway = IdentityGateway::new(provider, profiles.clone(), session.clone(), config.clone(), host.clone());
        let gate = RouteGate::new(session.clone(), RoleResolver::new(profiles));
        info!(target: "bilo::app", host = %host.hostname, auth_domain = %config.auth_domain(&host), "client started");
        Self { config, session, gateway, gate, navigator: Mutex::new(Navigator::new()), banner: Mutex::new(BannerState::default()) }
    }

    pub fn shutdown(&self) {
        self.session.dispose();
        info!(target: "bilo::app", "client stopped");
    }

    pub fn config(&self) -> &AppConfig { &self.config }
    pub fn session(&self) -> &Arc<SessionStore> { &self.session }
    pub fn gateway(&self) -> &IdentityGateway { &self.gateway }
    pub fn gate(&self) -> &RouteGate { &self.gate }

    /// Views stay unmounted until the provider has reported the initial auth state.
    pub fn is_ready(&self) -> bool { self.session.is_ready() }

    async fn refresh_role(&self) -> GateState {
        match self.gate.resolve_role().await {
            Ok(state) => state,
            Err(e) => {
                warn!(target: "bilo::app", error = %e, "role lookup failed; role stays unresolved");
                self.gate.state()
            }
        }
    }

    /// Resolve the role if needed, then authorize and record the navigation.
    pub async fn navigate(&self, location: &str) -> Navigation {
        self.refresh_role().await;
        self.navigator.lock().navigate(&self.gate, location)
    }

    /// Sign in, then send vendors to their dashboard and everyone else home.
    ///
    /// Dispatch waits for a known role. A failed role lookup or a missing profile leaves the
    /// user signed in on the current view with an error notice.
    pub async fn login(&self, email: &str, password: &str) -> Result<Navigation, Notice> {
        self.gateway.login(email, password).await.map_err(|e| Notice::from_error("login", &e))?;
        let state = self.gate.resolve_role().await.map_err(|e| Notice::from_error("login", &e))?;
        let Some(destination) = self.gate.post_login_destination() else {
            warn!(target: "bilo::app", uid = ?state.identity_id(), "signed in without a profile; not routable");
            return Err(Notice::error("account_not_ready", ACCOUNT_NOT_READY));
        };
        Ok(self.navigator.lock().navigate(&self.gate, &destination.path()))
    }

    /// Location saved by the last login redirect. Dispatch after login is by role, so using
    /// it is up to the caller; reading it clears it.
    pub fn take_return_to(&self) -> Option<String> { self.navigator.lock().take_return_to() }

    pub async fn signup(&self, email: &str, password: &str, wants_vendor_role: bool) -> Result<Identity, Notice> {
        let identity = self
            .gateway
            .signup(email, password, wants_vendor_role)
            .await
            .map_err(|e| Notice::from_error("signup", &e))?;
        self.banner.lock().dismissed = false;
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<Navigation, Notice> {
        self.gateway.logout().await.map_err(|e| Notice::from_error("logout", &e))?;
        Ok(self.navigator.lock().navigate(&self.gate, &Route::Home.path()))
    }

    /// Same confirmation whether or not the address has an account.
    pub async fn forgot_password(&self, email: &str) -> Result<Notice, Notice> {
        if email.trim().is_empty() {
            return Err(Notice::error("email_required", EMAIL_REQUIRED));
        }
        match self.gateway.request_password_reset(email.trim()).await {
            Ok(()) | Err(AppError::UserNotFound { .. }) => Ok(Notice::info("password_reset_sent", PASSWORD_RESET_SENT)),
            Err(e) => {
                log_failure("forgot_password", &e);
                Err(Notice::error(e.code_str(), PASSWORD_RESET_FAILED))
            }
        }
    }

    /// Handle a link from a verification or reset email.
    pub async fn handle_action_link(&self, link: &str, new_password: Option<&str>) -> Result<Navigation, Notice> {
        let request = ActionRequest::from_link(link).map_err(|e| Notice::from_error("auth_action", &e))?;
        self.gateway.apply_action(&request, new_password).await.map_err(|e| Notice::from_error("auth_action", &e))?;
        let next = match request.mode {
            ActionMode::VerifyEmail => Route::EmailVerified,
            _ => Route::Login,
        };
        Ok(self.navigator.lock().navigate(&self.gate, &next.path()))
    }

    pub fn verification_banner_visible(&self) -> bool {
        let s = self.session.current();
        s.is_authenticated() && !s.email_verified && !self.banner.lock().dismissed
    }

    pub fn dismiss_verification_banner(&self) {
        let mut banner = self.banner.lock();
        banner.dismissed = true;
        banner.sent = false;
    }

    /// Each attempt starts from a cleared "sent" state so the banner can be used again.
    pub async fn resend_verification(&self) -> Result<Notice, Notice> {
        self.banner.lock().sent = false;
        match self.gateway.resend_verification_email().await {
            Ok(()) => {
                self.banner.lock().sent = true;
                Ok(Notice::info("verification_sent", VERIFICATION_SENT))
            }
            Err(e) => {
                log_failure("resend_verification", &e);
                Err(Notice::error(e.code_str(), VERIFICATION_RESEND_FAILED))
            }
        }
    }

    pub fn verification_resent(&self) -> bool { self.banner.lock().sent }

    pub fn open_support_dialog(&self) -> bool {
        let role = self.gate.state().role();
        self.navigator.lock().open_support_dialog(role)
    }

    pub fn support_dialog_open(&self) -> bool { self.navigator.lock().support_dialog_open() }
}

impl Drop for BiloApp {
    fn drop(&mut self) { self.session.dispose(); }
}
