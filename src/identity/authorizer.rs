use std::sync::Arc;

use tracing::{debug, warn};

use super::profile::{ProfileRepository, Role, StoreError};
use crate::error::{AppError, AppResult};

/// Derives a user's role from their profile document.
#[derive(Clone)]
pub struct RoleResolver {
    profiles: Arc<dyn ProfileRepository>,
}

impl RoleResolver {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self { Self { profiles } }

    /// `Ok(None)` means no profile exists yet (e.g. signup still writing it): the user is
    /// signed in but not yet routable, which is different from anonymous.
    pub async fn resolve_role(&self, identity_id: &str) -> AppResult<Option<Role>> {
        match self.profiles.get_profile(identity_id).await {
            Ok(Some(profile)) => {
                debug!(target: "bilo::auth", uid = %identity_id, role = %profile.role, "role resolved");
                Ok(Some(profile.role))
            }
            Ok(None) => {
                debug!(target: "bilo::auth", uid = %identity_id, "no profile yet; role unresolved");
                Ok(None)
            }
            Err(StoreError::Unavailable(msg)) | Err(StoreError::Rejected(msg)) => {
                warn!(target: "bilo::auth", uid = %identity_id, error = %msg, "role lookup failed");
                Err(AppError::transient(msg))
            }
        }
    }
}
