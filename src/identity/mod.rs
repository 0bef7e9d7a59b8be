//! Identity, session and role management for the client.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod profile;
mod authorizer;
mod gateway;
mod redirect;
mod action;
pub mod memory;

pub use principal::Identity;
pub use session::{Session, SessionStore};
pub use provider::{AuthStateListener, AuthSubscription, IdentityProvider, ProviderError, ProviderResult};
pub use profile::{NewProfile, Profile, ProfileRepository, Role, StoreError};
pub use authorizer::RoleResolver;
pub use gateway::IdentityGateway;
pub use redirect::{password_reset_settings, verification_settings, ActionCodeSettings, AUTH_ACTION_PATH, EMAIL_VERIFIED_PATH};
pub use action::{ActionMode, ActionRequest};
