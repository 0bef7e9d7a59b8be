//! Unified application error model and mapping helpers.
//! Every identity, profile and email failure surfaces as one `AppError` variant with a
//! stable code, and each variant maps to the localized message shown next to the
//! user action that caused it.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Sign-in rejected. Unknown user and wrong password both map here.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Signup for an email that already has an identity.
    #[error("an identity already exists for {email}")]
    IdentityConflict { email: String },
    /// Password reset requested for an email with no identity.
    #[error("no identity registered for {email}")]
    UserNotFound { email: String },
    #[error("no active session")]
    NoActiveSession,
    /// Identity was created but its profile document was not. The identity is left in place.
    #[error("profile write failed for identity {uid}: {message}")]
    ProfileWriteFailure { uid: String, message: String },
    #[error("transient failure: {message}")]
    TransientFailure { message: String },
    /// The email API answered non-2xx or could not be reached.
    #[error("email delivery failed (status {status:?}): {message}")]
    DeliveryFailure { status: Option<u16>, message: String },
    #[error("{code}: {message}")]
    InvalidInput { code: String, message: String },
    /// A local fault (hashing, entropy source) that a retry will not fix.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn transient<S: Into<String>>(msg: S) -> Self { AppError::TransientFailure { message: msg.into() } }
    pub fn input<S: Into<String>>(code: S, msg: S) -> Self { AppError::InvalidInput { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { AppError::Internal { message: msg.into() } }
    pub fn delivery<S: Into<String>>(status: Option<u16>, msg: S) -> Self { AppError::DeliveryFailure { status, message: msg.into() } }

    pub fn code_str(&self) -> &str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::IdentityConflict { .. } => "identity_conflict",
            AppError::UserNotFound { .. } => "user_not_found",
            AppError::NoActiveSession => "no_active_session",
            AppError::ProfileWriteFailure { .. } => "profile_write_failure",
            AppError::TransientFailure { .. } => "transient_failure",
            AppError::DeliveryFailure { .. } => "delivery_failure",
            AppError::InvalidInput { code, .. } => code.as_str(),
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// Localized (Finnish) message for the UI. Never includes provider internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "Virheellinen sähköposti tai salasana",
            AppError::IdentityConflict { .. } => "Sähköpostiosoite on jo käytössä",
            AppError::UserNotFound { .. } => "Sähköpostiosoitetta ei löytynyt",
            AppError::NoActiveSession => "Kirjaudu sisään jatkaaksesi",
            AppError::ProfileWriteFailure { .. } => "Tilin luonti epäonnistui. Ota yhteyttä asiakastukeen.",
            AppError::TransientFailure { .. } => "Yhteysvirhe. Yritä uudelleen.",
            AppError::DeliveryFailure { .. } => "Sähköpostin lähetys epäonnistui",
            AppError::InvalidInput { .. } => "Tarkista syöttämäsi tiedot",
            AppError::Internal { .. } => "Odottamaton virhe. Ota yhteyttä asiakastukeen.",
        }
    }

    /// True when a manual retry by the user may succeed. Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientFailure { .. } | AppError::DeliveryFailure { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
