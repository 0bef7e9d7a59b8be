//! In-process stand-ins for the identity provider and the profile store.
//! They follow the hosted services' observable contracts (sign-in on account creation,
//! immediate notification of new auth subscribers, single-use action codes) and add
//! switches for simulating outages. Used by tests and the CLI.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use password_hash::{PasswordHash, SaltString};
use tracing::debug;

use super::principal::Identity;
use super::profile::{NewProfile, Profile, ProfileRepository, StoreError};
use super::provider::{AuthStateListener, AuthSubscription, IdentityProvider, ProviderError, ProviderResult};
use super::redirect::ActionCodeSettings;

const MIN_PASSWORD_LEN: usize = 6;

fn gen_code() -> ProviderResult<String> {
    let mut buf = [0u8; 24];
    getrandom::getrandom(&mut buf).map_err(|e| ProviderError::Internal(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

// Low-cost parameters: this store never holds real credentials.
fn hasher() -> ProviderResult<Argon2<'static>> {
    let params = Params::new(4096, 1, 1, None).map_err(|e| ProviderError::Internal(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_password(password: &str) -> ProviderResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| ProviderError::Internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| ProviderError::Internal(e.to_string()))?;
    let phc = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ProviderError::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match (PasswordHash::new(hash), hasher()) {
        (Ok(parsed), Ok(argon2)) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        _ => false,
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
    email_verified: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity { uid: self.uid.clone(), email: self.email.clone(), email_verified: self.email_verified }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxKind {
    Verification,
    PasswordReset,
}

/// A message the provider would have emailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub kind: OutboxKind,
    pub email: String,
    pub code: String,
    pub continue_url: String,
}

#[derive(Default)]
struct ProviderState {
    // keyed by lowercase email
    accounts: HashMap<String, Account>,
    current: Option<String>,
    // bumped on every sign-in state change
    version: u64,
    // action code -> (kind, lowercase email)
    codes: HashMap<String, (OutboxKind, String)>,
    outbox: Vec<OutboxEntry>,
}

impl ProviderState {
    fn current_identity(&self) -> Option<Identity> {
        self.current.as_ref().and_then(|k| self.accounts.get(k)).map(Account::identity)
    }

    fn set_current(&mut self, key: Option<String>) -> AuthEvent {
        self.current = key;
        self.version += 1;
        self.event()
    }

    fn event(&self) -> AuthEvent {
        AuthEvent { version: self.version, identity: self.current_identity() }
    }
}

/// Auth state captured under the state lock, tagged with the change it reflects.
struct AuthEvent {
    version: u64,
    identity: Option<Identity>,
}

type Listeners = Arc<Mutex<HashMap<u64, AuthStateListener>>>;

#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: RwLock<ProviderState>,
    listeners: Listeners,
    next_listener: AtomicU64,
    // version of the last delivered event; held while listeners run
    delivered: Mutex<u64>,
    offline: AtomicBool,
    fail_verification_sends: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self { Self::default() }

    /// Every subsequent call fails with a network error.
    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    pub fn fail_verification_sends(&self, fail: bool) { self.fail_verification_sends.store(fail, Ordering::SeqCst); }

    /// Number of provider operations invoked so far (subscriptions excluded).
    pub fn call_count(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn outbox(&self) -> Vec<OutboxEntry> { self.state.read().outbox.clone() }

    pub fn subscriber_count(&self) -> usize { self.listeners.lock().len() }

    /// The most recent action code mailed to `email` for `kind`.
    pub fn last_code_for(&self, email: &str, kind: OutboxKind) -> Option<String> {
        self.state.read().outbox.iter().rev()
            .find(|e| e.kind == kind && e.email.eq_ignore_ascii_case(email))
            .map(|e| e.code.clone())
    }

    fn enter(&self) -> ProviderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("identity provider unreachable".into()));
        }
        Ok(())
    }

    #[cfg(test)]
    fn current_identity(&self) -> Option<Identity> { self.state.read().current_identity() }

    // Deliveries are serialized in version order. An event older than one already delivered
    // is dropped, so subscribers always end on the latest state. Listeners run outside the
    // state lock and may read the provider.
    fn deliver(&self, event: AuthEvent) {
        let mut delivered = self.delivered.lock();
        if event.version < *delivered {
            debug!(target: "bilo::provider", stale = event.version, latest = *delivered, "skipping superseded auth event");
            return;
        }
        *delivered = event.version;
        let listeners: Vec<AuthStateListener> = self.listeners.lock().values().cloned().collect();
        for l in listeners {
            l(event.identity.clone());
        }
    }

    fn issue_code(&self, kind: OutboxKind, email: &str, settings: &ActionCodeSettings) -> ProviderResult<String> {
        let code = gen_code()?;
        let mut st = self.state.write();
        st.codes.insert(code.clone(), (kind, email.to_ascii_lowercase()));
        st.outbox.push(OutboxEntry { kind, email: email.to_string(), code: code.clone(), continue_url: settings.url.clone() });
        Ok(code)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> ProviderResult<Identity> {
        self.enter()?;
        if !looks_like_email(email) { return Err(ProviderError::InvalidEmail); }
        if password.chars().count() < MIN_PASSWORD_LEN { return Err(ProviderError::WeakPassword); }
        let key = email.trim().to_ascii_lowercase();
        if self.state.read().accounts.contains_key(&key) { return Err(ProviderError::EmailAlreadyInUse); }
        let password_hash = hash_password(password)?;
        let account = Account { uid: uuid::Uuid::new_v4().simple().to_string(), email: email.trim().to_string(), password_hash, email_verified: false };
        let identity = account.identity();
        let event = {
            let mut st = self.state.write();
            if st.accounts.contains_key(&key) { return Err(ProviderError::EmailAlreadyInUse); }
            st.accounts.insert(key.clone(), account);
            st.set_current(Some(key))
        };
        debug!(target: "bilo::provider", uid = %identity.uid, "account created");
        self.deliver(event);
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<Identity> {
        self.enter()?;
        let key = email.trim().to_ascii_lowercase();
        let account = self.state.read().accounts.get(&key).cloned().ok_or(ProviderError::UserNotFound)?;
        if !verify_password(&account.password_hash, password) { return Err(ProviderError::WrongPassword); }
        let event = {
            let mut st = self.state.write();
            if st.current.as_deref() != Some(key.as_str()) { Some(st.set_current(Some(key))) } else { None }
        };
        if let Some(event) = event { self.deliver(event); }
        Ok(account.identity())
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        self.enter()?;
        let event = {
            let mut st = self.state.write();
            if st.current.is_some() { Some(st.set_current(None)) } else { None }
        };
        if let Some(event) = event { self.deliver(event); }
        Ok(())
    }

    async fn send_verification_email(&self, identity: &Identity, settings: &ActionCodeSettings) -> ProviderResult<()> {
        self.enter()?;
        if self.fail_verification_sends.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("verification mail rejected".into()));
        }
        if !self.state.read().accounts.contains_key(&identity.email.to_ascii_lowercase()) {
            return Err(ProviderError::UserNotFound);
        }
        self.issue_code(OutboxKind::Verification, &identity.email, settings)?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, settings: &ActionCodeSettings) -> ProviderResult<()> {
        self.enter()?;
        if !looks_like_email(email) { return Err(ProviderError::InvalidEmail); }
        if !self.state.read().accounts.contains_key(&email.trim().to_ascii_lowercase()) {
            return Err(ProviderError::UserNotFound);
        }
        self.issue_code(OutboxKind::PasswordReset, email.trim(), settings)?;
        Ok(())
    }

    async fn apply_action_code(&self, code: &str) -> ProviderResult<()> {
        self.enter()?;
        let mut st = self.state.write();
        match st.codes.get(code).cloned() {
            Some((OutboxKind::Verification, key)) => {
                st.codes.remove(code);
                let acct = st.accounts.get_mut(&key).ok_or(ProviderError::UserNotFound)?;
                acct.email_verified = true;
                Ok(())
            }
            _ => Err(ProviderError::InvalidActionCode),
        }
    }

    async fn confirm_password_reset(&self, code: &str, new_password: &str) -> ProviderResult<()> {
        self.enter()?;
        if new_password.chars().count() < MIN_PASSWORD_LEN { return Err(ProviderError::WeakPassword); }
        let key = match self.state.read().codes.get(code) {
            Some((OutboxKind::PasswordReset, key)) => key.clone(),
            _ => return Err(ProviderError::InvalidActionCode),
        };
        let password_hash = hash_password(new_password)?;
        let mut st = self.state.write();
        st.codes.remove(code);
        let acct = st.accounts.get_mut(&key).ok_or(ProviderError::UserNotFound)?;
        acct.password_hash = password_hash;
        Ok(())
    }

    async fn reload_current(&self) -> ProviderResult<Option<Identity>> {
        self.enter()?;
        let event = self.state.read().event();
        let identity = event.identity.clone();
        // Claims may have changed since the last notification (e.g. verification applied).
        if identity.is_some() { self.deliver(event); }
        Ok(identity)
    }

    fn subscribe_auth_state(&self, listener: AuthStateListener) -> AuthSubscription {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        // Registration and the initial call sit inside the delivery order.
        let _ordered = self.delivered.lock();
        self.listeners.lock().insert(id, Arc::clone(&listener));
        let current = self.state.read().current_identity();
        listener(current);
        let listeners = Arc::clone(&self.listeners);
        AuthSubscription::new(move || {
            listeners.lock().remove(&id);
        })
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: RwLock<HashMap<String, Profile>>,
    fail_writes: AtomicBool,
    offline: AtomicBool,
}

impl MemoryProfileRepository {
    pub fn new() -> Self { Self::default() }

    pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    /// Seed a profile directly, e.g. an admin created out of band.
    pub fn insert(&self, profile: Profile) { self.profiles.write().insert(profile.id.clone(), profile); }

    pub fn len(&self) -> usize { self.profiles.read().len() }

    pub fn is_empty(&self) -> bool { self.profiles.read().is_empty() }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn create_profile(&self, id: &str, fields: NewProfile) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) { return Err(StoreError::Unavailable("profile store offline".into())); }
        if self.fail_writes.load(Ordering::SeqCst) { return Err(StoreError::Rejected(format!("users/{} write denied", id))); }
        self.profiles.write().insert(id.to_string(), fields.into_profile(id));
        Ok(())
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        if self.offline.load(Ordering::SeqCst) { return Err(StoreError::Unavailable("profile store offline".into())); }
        Ok(self.profiles.read().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ActionCodeSettings {
        ActionCodeSettings { url: "http://localhost:5173/email-verified".into(), handle_code_in_app: true }
    }

    #[tokio::test]
    async fn create_account_signs_in_and_notifies() {
        let p = MemoryIdentityProvider::new();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = p.subscribe_auth_state(Arc::new(move |i: Option<Identity>| sink.lock().push(i.map(|i| i.uid))));
        let id = p.create_account("a@bilo.fi", "secret1").await.unwrap();
        assert_eq!(*seen.lock(), vec![None, Some(id.uid.clone())]);
        assert_eq!(p.create_account("A@bilo.fi", "secret1").await, Err(ProviderError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn sign_in_distinguishes_failures_internally() {
        let p = MemoryIdentityProvider::new();
        p.create_account("a@bilo.fi", "secret1").await.unwrap();
        assert_eq!(p.sign_in("a@bilo.fi", "wrong!!").await.unwrap_err(), ProviderError::WrongPassword);
        assert_eq!(p.sign_in("nobody@bilo.fi", "secret1").await.unwrap_err(), ProviderError::UserNotFound);
        assert!(p.sign_in("A@BILO.FI", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let p = MemoryIdentityProvider::new();
        let sub = p.subscribe_auth_state(Arc::new(|_i: Option<Identity>| {}));
        assert_eq!(p.subscriber_count(), 1);
        drop(sub);
        assert_eq!(p.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn verification_code_is_single_use() {
        let p = MemoryIdentityProvider::new();
        let id = p.create_account("a@bilo.fi", "secret1").await.unwrap();
        p.send_verification_email(&id, &settings()).await.unwrap();
        let code = p.last_code_for("a@bilo.fi", OutboxKind::Verification).unwrap();
        p.apply_action_code(&code).await.unwrap();
        assert_eq!(p.apply_action_code(&code).await, Err(ProviderError::InvalidActionCode));
        assert!(p.reload_current().await.unwrap().unwrap().email_verified);
    }

    #[tokio::test]
    async fn each_mailed_code_is_distinct_and_usable() {
        let p = MemoryIdentityProvider::new();
        p.create_account("a@bilo.fi", "secret1").await.unwrap();
        p.send_password_reset("a@bilo.fi", &settings()).await.unwrap();
        p.send_password_reset("a@bilo.fi", &settings()).await.unwrap();
        let outbox = p.outbox();
        assert_eq!(outbox.len(), 2);
        assert_ne!(outbox[0].code, outbox[1].code);
        p.confirm_password_reset(&outbox[0].code, "uusi123").await.unwrap();
        p.confirm_password_reset(&outbox[1].code, "uusi456").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_changes_leave_subscribers_on_latest_state() {
        let p = Arc::new(MemoryIdentityProvider::new());
        p.create_account("a@bilo.fi", "secret1").await.unwrap();
        p.create_account("b@bilo.fi", "secret1").await.unwrap();
        let last: Arc<Mutex<Option<Option<String>>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last);
        let _sub = p.subscribe_auth_state(Arc::new(move |i: Option<Identity>| *sink.lock() = Some(i.map(|i| i.uid))));

        let mut tasks = Vec::new();
        for n in 0..30 {
            let p = Arc::clone(&p);
            tasks.push(tokio::spawn(async move {
                match n % 3 {
                    0 => { let _ = p.sign_in("a@bilo.fi", "secret1").await; }
                    1 => { let _ = p.sign_in("b@bilo.fi", "secret1").await; }
                    _ => { let _ = p.sign_out().await; }
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        let expected = p.current_identity().map(|i| i.uid);
        assert_eq!(*last.lock(), Some(expected));
    }

    #[tokio::test]
    async fn offline_provider_counts_calls() {
        let p = MemoryIdentityProvider::new();
        p.set_offline(true);
        assert!(matches!(p.sign_out().await, Err(ProviderError::Network(_))));
        assert_eq!(p.call_count(), 1);
    }

    #[tokio::test]
    async fn repository_write_failure() {
        let repo = MemoryProfileRepository::new();
        repo.fail_writes(true);
        let fields = NewProfile { email: "a@bilo.fi".into(), role: super::super::profile::Role::Customer, created_at: chrono::Utc::now(), email_verified: false };
        assert!(matches!(repo.create_profile("u1", fields).await, Err(StoreError::Rejected(_))));
        assert!(repo.is_empty());
    }
}
