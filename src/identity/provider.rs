use std::sync::Arc;

use async_trait::async_trait;

use super::principal::Identity;
use super::redirect::ActionCodeSettings;
use crate::error::AppError;

/// Failure classes reported by the identity provider. The gateway decides how each one
/// surfaces to the user; see `ProviderError::into_login_error` and friends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password does not meet the provider policy")]
    WeakPassword,
    #[error("user not found")]
    UserNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("user disabled")]
    UserDisabled,
    #[error("no signed-in user")]
    NoCurrentUser,
    #[error("invalid or expired action code")]
    InvalidActionCode,
    #[error("network error: {0}")]
    Network(String),
    /// Fault inside the provider client itself, not the remote service.
    #[error("internal provider error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Login collapses every credential problem into one answer so accounts cannot be enumerated.
    pub fn into_login_error(self) -> AppError {
        match self {
            ProviderError::Network(msg) => AppError::transient(msg),
            ProviderError::Internal(msg) => AppError::internal(msg),
            _ => AppError::InvalidCredentials,
        }
    }

    pub fn into_signup_error(self, email: &str) -> AppError {
        match self {
            ProviderError::EmailAlreadyInUse => AppError::IdentityConflict { email: email.to_string() },
            ProviderError::InvalidEmail => AppError::input("invalid_email", "email address rejected by provider"),
            ProviderError::WeakPassword => AppError::input("weak_password", "password rejected by provider"),
            ProviderError::Network(msg) => AppError::transient(msg),
            ProviderError::Internal(msg) => AppError::internal(msg),
            other => AppError::transient(other.to_string()),
        }
    }

    pub fn into_reset_error(self, email: &str) -> AppError {
        match self {
            ProviderError::UserNotFound => AppError::UserNotFound { email: email.to_string() },
            ProviderError::InvalidEmail => AppError::input("invalid_email", "email address rejected by provider"),
            ProviderError::Network(msg) => AppError::transient(msg),
            ProviderError::Internal(msg) => AppError::internal(msg),
            other => AppError::transient(other.to_string()),
        }
    }

    pub fn into_action_error(self) -> AppError {
        match self {
            ProviderError::InvalidActionCode => AppError::input("invalid_action_code", "action code is invalid or expired"),
            ProviderError::WeakPassword => AppError::input("weak_password", "password rejected by provider"),
            ProviderError::NoCurrentUser => AppError::NoActiveSession,
            ProviderError::Network(msg) => AppError::transient(msg),
            ProviderError::Internal(msg) => AppError::internal(msg),
            other => AppError::transient(other.to_string()),
        }
    }

    /// Anything else (sign-out, verification sends) only distinguishes transport failures.
    pub fn into_app_error(self) -> AppError {
        match self {
            ProviderError::NoCurrentUser => AppError::NoActiveSession,
            ProviderError::Network(msg) => AppError::transient(msg),
            ProviderError::Internal(msg) => AppError::internal(msg),
            other => AppError::transient(other.to_string()),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Receives the provider's auth state: `Some` while signed in, `None` after sign-out.
pub type AuthStateListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Handle returned by `subscribe_auth_state`. Dropping it unsubscribes.
pub struct AuthSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl AuthSubscription {
    pub fn new<F: FnOnce() + Send + 'static>(unsubscribe: F) -> Self {
        Self { unsubscribe: Some(Box::new(unsubscribe)) }
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() { f(); }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() { f(); }
    }
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription").field("active", &self.unsubscribe.is_some()).finish()
    }
}

/// Client contract of the external identity provider.
///
/// Implementations must deliver auth state notifications in the order state changes
/// happen, and must notify a new subscriber of the current state right away.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates the account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> ProviderResult<Identity>;
    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<Identity>;
    /// Succeeds when nobody is signed in.
    async fn sign_out(&self) -> ProviderResult<()>;
    async fn send_verification_email(&self, identity: &Identity, settings: &ActionCodeSettings) -> ProviderResult<()>;
    async fn send_password_reset(&self, email: &str, settings: &ActionCodeSettings) -> ProviderResult<()>;
    async fn apply_action_code(&self, code: &str) -> ProviderResult<()>;
    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> ProviderResult<()>;
    /// Refreshes the signed-in identity's claims, notifying subscribers when they changed.
    async fn reload_current(&self) -> ProviderResult<Option<Identity>>;
    fn subscribe_auth_state(&self, listener: AuthStateListener) -> AuthSubscription;
}
