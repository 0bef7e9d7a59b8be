use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::routes::{Access, Route};
use crate::error::AppResult;
use crate::identity::{Role, RoleResolver, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Anonymous,
    AuthenticatedUnresolvedRole { identity_id: String },
    AuthenticatedRoleKnown { identity_id: String, role: Role },
}

impl GateState {
    pub fn identity_id(&self) -> Option<&str> {
        match self {
            GateState::Anonymous => None,
            GateState::AuthenticatedUnresolvedRole { identity_id } | GateState::AuthenticatedRoleKnown { identity_id, .. } => Some(identity_id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            GateState::AuthenticatedRoleKnown { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Outcome of authorizing one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    /// Not signed in; `from` is the location to return to after login.
    RedirectToLogin { from: String },
    /// Signed in with a role that may not see the view.
    Redirect { to: String },
    /// Signed in but the role is not known yet; render nothing.
    Pending,
}

/// A role lookup issued for one identity. Results are applied only while that identity
/// is still the current session's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLookup {
    identity_id: String,
}

impl RoleLookup {
    pub fn identity_id(&self) -> &str { &self.identity_id }
}

/// Decides render vs redirect for every navigation from the session and the user's role.
pub struct RouteGate {
    session: Arc<SessionStore>,
    resolver: RoleResolver,
    state: Mutex<GateState>,
}

impl RouteGate {
    pub fn new(session: Arc<SessionStore>, resolver: RoleResolver) -> Self {
        Self { session, resolver, state: Mutex::new(GateState::Anonymous) }
    }

    /// Bring the gate in line with the session: a new identity starts unresolved,
    /// no identity is anonymous, the same identity keeps what it had.
    pub fn sync_session(&self) -> GateState {
        let current = self.session.current().identity_id;
        let mut st = self.state.lock();
        let next = match (current, st.identity_id()) {
            (None, _) => GateState::Anonymous,
            (Some(id), Some(known)) if id == known => st.clone(),
            (Some(id), _) => GateState::AuthenticatedUnresolvedRole { identity_id: id },
        };
        if *st != next {
            debug!(target: "bilo::gate", from = ?*st, to = ?next, "gate state changed");
            *st = next.clone();
        }
        next
    }

    pub fn state(&self) -> GateState { self.sync_session() }

    /// Ticket for resolving the current identity's role, if one is needed.
    pub fn begin_role_lookup(&self) -> Option<RoleLookup> {
        match self.sync_session() {
            GateState::AuthenticatedUnresolvedRole { identity_id } => Some(RoleLookup { identity_id }),
            _ => None,
        }
    }

    /// Apply a lookup result. Returns false when it was discarded: the session has moved on
    /// to another identity, or there was no profile to read a role from.
    pub fn complete_role_lookup(&self, lookup: RoleLookup, role: Option<Role>) -> bool {
        let state = self.sync_session();
        if state.identity_id() != Some(lookup.identity_id.as_str()) {
            debug!(target: "bilo::gate", stale = %lookup.identity_id, current = ?state.identity_id(), "discarding stale role lookup");
            return false;
        }
        let Some(role) = role else { return false; };
        let mut st = self.state.lock();
        // Re-check under the lock; the session may have changed since sync.
        if st.identity_id() != Some(lookup.identity_id.as_str()) {
            return false;
        }
        *st = GateState::AuthenticatedRoleKnown { identity_id: lookup.identity_id, role };
        true
    }

    /// Resolve the role for the current identity when it is not known yet.
    pub async fn resolve_role(&self) -> AppResult<GateState> {
        if let Some(lookup) = self.begin_role_lookup() {
            let role = self.resolver.resolve_role(lookup.identity_id()).await?;
            self.complete_role_lookup(lookup, role);
        }
        Ok(self.state())
    }

    pub fn authorize(&self, route: &Route) -> GateDecision {
        let state = self.sync_session();
        match (route.access(), &state) {
            (Access::Public, _) => GateDecision::Render,
            (_, GateState::Anonymous) => GateDecision::RedirectToLogin { from: route.path() },
            (Access::Authenticated, _) => GateDecision::Render,
            (Access::Roles(_), GateState::AuthenticatedUnresolvedRole { .. }) => GateDecision::Pending,
            (Access::Roles(allowed), GateState::AuthenticatedRoleKnown { role, .. }) => {
                if allowed.contains(role) {
                    GateDecision::Render
                } else {
                    GateDecision::Redirect { to: Route::home_for(Some(*role)).path() }
                }
            }
        }
    }

    /// Destination after a successful login: vendor dashboard for vendors, home otherwise.
    /// `None` until the role is known.
    pub fn post_login_destination(&self) -> Option<Route> { self.state().role().map(|r| Route::home_for(Some(r))) }
}
