use super::gate::{GateDecision, RouteGate};
use super::routes::Route;
use crate::identity::Role;

/// Page transition direction: deeper paths slide forward, shallower ones back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// What was asked for.
    pub requested: Route,
    pub decision: GateDecision,
    /// What is actually shown after applying the decision. `None` while pending.
    pub shown: Option<Route>,
    pub direction: Direction,
}

/// Per-client navigation state that sits beside the router: transition direction and
/// the support dialog, which closes on every route change.
#[derive(Debug)]
pub struct Navigator {
    prev_path: String,
    direction: Direction,
    support_dialog_open: bool,
    /// Requested location kept across a login redirect.
    return_to: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self { prev_path: "/".into(), direction: Direction::Forward, support_dialog_open: false, return_to: None }
    }
}

impl Navigator {
    pub fn new() -> Self { Self::default() }

    pub fn navigate(&mut self, gate: &RouteGate, location: &str) -> Navigation {
        let requested = Route::parse(location);
        let decision = gate.authorize(&requested);
        let shown = match &decision {
            GateDecision::Render => Some(requested.clone()),
            GateDecision::RedirectToLogin { from } => {
                self.return_to = Some(from.clone());
                Some(Route::Login)
            }
            GateDecision::Redirect { to } => Some(Route::parse(to)),
            GateDecision::Pending => None,
        };
        if let Some(route) = &shown {
            self.enter(&route.path());
        }
        Navigation { requested, decision, shown, direction: self.direction }
    }

    fn enter(&mut self, path: &str) {
        if path != self.prev_path {
            self.direction = if path.len() > self.prev_path.len() { Direction::Forward } else { Direction::Backward };
            self.prev_path = path.to_string();
            self.support_dialog_open = false;
        }
    }

    pub fn current_path(&self) -> &str { &self.prev_path }

    pub fn direction(&self) -> Direction { self.direction }

    /// Location saved by the last login redirect, consumed on read.
    pub fn take_return_to(&mut self) -> Option<String> { self.return_to.take() }

    /// The dialog is role specific, so it only opens once a role is known.
    pub fn open_support_dialog(&mut self, role: Option<Role>) -> bool {
        self.support_dialog_open = role.is_some();
        self.support_dialog_open
    }

    pub fn close_support_dialog(&mut self) { self.support_dialog_open = false; }

    pub fn support_dialog_open(&self) -> bool { self.support_dialog_open }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::identity::memory::MemoryIdentityProvider;
    use crate::identity::memory::MemoryProfileRepository;
    use crate::identity::{RoleResolver, SessionStore};

    fn anonymous_gate() -> (Arc<MemoryIdentityProvider>, RouteGate) {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let session = Arc::new(SessionStore::new());
        session.init(provider.as_ref());
        let gate = RouteGate::new(session, RoleResolver::new(Arc::new(MemoryProfileRepository::new())));
        (provider, gate)
    }

    #[test]
    fn direction_follows_path_length() {
        let (_p, gate) = anonymous_gate();
        let mut nav = Navigator::new();
        assert_eq!(nav.navigate(&gate, "/search").direction, Direction::Forward);
        assert_eq!(nav.navigate(&gate, "/vendor/abc").direction, Direction::Forward);
        assert_eq!(nav.navigate(&gate, "/").direction, Direction::Backward);
    }

    #[test]
    fn route_change_closes_support_dialog() {
        let (_p, gate) = anonymous_gate();
        let mut nav = Navigator::new();
        assert!(!nav.open_support_dialog(None));
        assert!(nav.open_support_dialog(Some(Role::Customer)));
        nav.navigate(&gate, "/search");
        assert!(!nav.support_dialog_open());
    }

    #[test]
    fn login_redirect_remembers_origin() {
        let (_p, gate) = anonymous_gate();
        let mut nav = Navigator::new();
        let n = nav.navigate(&gate, "/customer/coins");
        assert_eq!(n.shown, Some(Route::Login));
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(nav.take_return_to().as_deref(), Some("/customer/coins"));
        assert_eq!(nav.take_return_to(), None);
    }
}
