use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::tprintln;

use super::principal::Identity;
use super::provider::{AuthSubscription, IdentityProvider};

/// Snapshot of the client's authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity_id: Option<String>,
    pub email: Option<String>,
    /// Provider claim, never the profile document's copy.
    pub email_verified: bool,
    /// True until the provider's first auth state notification arrives.
    pub is_loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self { identity_id: None, email: None, email_verified: false, is_loading: true }
    }

    pub fn from_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(id) => Self {
                identity_id: Some(id.uid.clone()),
                email: Some(id.email.clone()),
                email_verified: id.email_verified,
                is_loading: false,
            },
            None => Self { identity_id: None, email: None, email_verified: false, is_loading: false },
        }
    }

    pub fn is_authenticated(&self) -> bool { self.identity_id.is_some() }

    /// The identity the session refers to, rebuilt for provider calls that take one.
    pub fn identity(&self) -> Option<Identity> {
        match (&self.identity_id, &self.email) {
            (Some(uid), Some(email)) => Some(Identity { uid: uid.clone(), email: email.clone(), email_verified: self.email_verified }),
            _ => None,
        }
    }
}

/// Holds the one `Session` of the running client and republishes provider auth state to
/// any number of watchers. The provider callback is the only writer.
///
/// Lifecycle: `new` (loading) → `init` (subscribes to the provider once) → `dispose`.
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
    subscription: Mutex<Option<AuthSubscription>>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::loading());
        Self { tx: Arc::new(tx), subscription: Mutex::new(None) }
    }

    /// Subscribe to the provider's auth state. A second call while subscribed is ignored.
    pub fn init(&self, provider: &dyn IdentityProvider) -> bool {
        let mut guard = self.subscription.lock();
        if guard.is_some() {
            warn!(target: "bilo::session", "session store already initialized; ignoring second init");
            return false;
        }
        let tx = Arc::clone(&self.tx);
        let sub = provider.subscribe_auth_state(Arc::new(move |identity: Option<Identity>| {
            publish(&tx, identity.as_ref());
        }));
        *guard = Some(sub);
        debug!(target: "bilo::session", "subscribed to identity provider auth state");
        true
    }

    /// Stop listening to the provider. The last published session stays readable.
    pub fn dispose(&self) {
        if let Some(sub) = self.subscription.lock().take() {
            sub.unsubscribe();
            debug!(target: "bilo::session", "unsubscribed from identity provider auth state");
        }
    }

    pub fn is_subscribed(&self) -> bool { self.subscription.lock().is_some() }

    pub fn current(&self) -> Session { self.tx.borrow().clone() }

    /// Render gate: dependent views mount only once this is true.
    pub fn is_ready(&self) -> bool { !self.tx.borrow().is_loading }

    /// Watch channel that yields every change to `identity_id` or `email_verified`.
    pub fn subscribe(&self) -> watch::Receiver<Session> { self.tx.subscribe() }

    /// Waits for the first provider notification, then returns the resolved session.
    pub async fn wait_until_resolved(&self) -> Session {
        let mut rx = self.tx.subscribe();
        let resolved = match rx.wait_for(|s| !s.is_loading).await {
            Ok(s) => Some(s.clone()),
            Err(_) => None,
        };
        resolved.unwrap_or_else(|| self.current())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.get_mut().take() { sub.unsubscribe(); }
    }
}

fn publish(tx: &watch::Sender<Session>, identity: Option<&Identity>) {
    let next = Session::from_identity(identity);
    let changed = tx.send_if_modified(|cur| {
        if *cur == next { return false; }
        *cur = next.clone();
        true
    });
    if changed {
        tprintln!("session.update uid={:?} verified={}", next.identity_id, next.email_verified);
        debug!(target: "bilo::session", uid = ?next.identity_id, verified = next.email_verified, "session updated");
    }
}
