// End-to-end auth flows through the client composition root, backed by the in-memory
// identity provider and profile store.

use std::sync::Arc;

use chrono::Utc;

use bilo::identity::memory::{MemoryIdentityProvider, MemoryProfileRepository, OutboxKind};
use bilo::identity::{Profile, Role};
use bilo::routing::{GateDecision, GateState, Route};
use bilo::{AppConfig, AppError, BiloApp, HostEnvironment, NoticeKind};

struct Harness {
    provider: Arc<MemoryIdentityProvider>,
    profiles: Arc<MemoryProfileRepository>,
    app: BiloApp,
}

fn harness() -> Harness {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let profiles = Arc::new(MemoryProfileRepository::new());
    let host = HostEnvironment::from_origin("http://localhost:5173").unwrap();
    let app = BiloApp::start(AppConfig::default(), host, provider.clone(), profiles.clone());
    Harness { provider, profiles, app }
}

async fn register(h: &Harness, email: &str, vendor: bool) -> String {
    let identity = h.app.signup(email, "salasana1", vendor).await.unwrap();
    h.app.logout().await.unwrap();
    identity.uid
}

#[tokio::test]
async fn anonymous_customer_view_goes_to_login_then_home() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;

    let nav = h.app.navigate("/customer/profile").await;
    assert_eq!(nav.decision, GateDecision::RedirectToLogin { from: "/customer/profile".into() });
    assert_eq!(nav.shown, Some(Route::Login));

    let nav = h.app.login("asiakas@example.fi", "salasana1").await.unwrap();
    assert_eq!(nav.shown, Some(Route::Home));
    assert_eq!(nav.decision, GateDecision::Render);

    // Dispatch is by role; the requested location is still available to the caller once.
    assert_eq!(h.app.take_return_to().as_deref(), Some("/customer/profile"));
    assert_eq!(h.app.take_return_to(), None);
}

#[tokio::test]
async fn vendor_login_during_profile_outage_shows_error_instead_of_home() {
    let h = harness();
    register(&h, "pesula@example.fi", true).await;
    h.profiles.set_offline(true);

    let notice = h.app.login("pesula@example.fi", "salasana1").await.unwrap_err();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.code, "transient_failure");
    assert!(h.app.session().current().is_authenticated());
    assert!(matches!(h.app.gate().state(), GateState::AuthenticatedUnresolvedRole { .. }));

    // Once the store is back the vendor reaches the dashboard.
    h.profiles.set_offline(false);
    let nav = h.app.navigate("/vendor-dashboard").await;
    assert_eq!(nav.decision, GateDecision::Render);
}

#[tokio::test]
async fn login_without_profile_is_not_routable() {
    let h = harness();
    h.profiles.fail_writes(true);
    h.app.signup("orpo@example.fi", "salasana1", true).await.unwrap_err();
    h.app.logout().await.unwrap();
    h.profiles.fail_writes(false);

    let notice = h.app.login("orpo@example.fi", "salasana1").await.unwrap_err();
    assert_eq!(notice.code, "account_not_ready");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(matches!(h.app.gate().state(), GateState::AuthenticatedUnresolvedRole { .. }));
}

#[tokio::test]
async fn vendor_login_lands_on_dashboard() {
    let h = harness();
    register(&h, "pesula@example.fi", true).await;

    let nav = h.app.navigate("/vendor-dashboard").await;
    assert_eq!(nav.shown, Some(Route::Login));

    let nav = h.app.login("pesula@example.fi", "salasana1").await.unwrap();
    assert_eq!(nav.shown, Some(Route::VendorDashboard));
    assert!(matches!(h.app.gate().state(), GateState::AuthenticatedRoleKnown { role: Role::Vendor, .. }));
}

#[tokio::test]
async fn customer_on_vendor_view_is_sent_home() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;
    h.app.login("asiakas@example.fi", "salasana1").await.unwrap();

    let nav = h.app.navigate("/vendor-offers").await;
    assert_eq!(nav.decision, GateDecision::Redirect { to: "/".into() });
    assert_eq!(nav.shown, Some(Route::Home));
}

#[tokio::test]
async fn admin_reaches_vendor_views_and_admin() {
    let h = harness();
    let uid = register(&h, "admin@example.fi", false).await;
    h.profiles.insert(Profile { id: uid, email: "admin@example.fi".into(), role: Role::Admin, created_at: Utc::now(), email_verified: true });

    let nav = h.app.login("admin@example.fi", "salasana1").await.unwrap();
    assert_eq!(nav.shown, Some(Route::Home));
    assert_eq!(h.app.navigate("/admin").await.decision, GateDecision::Render);
    assert_eq!(h.app.navigate("/vendor-calendar").await.decision, GateDecision::Render);
}

#[tokio::test]
async fn failed_login_leaves_gate_anonymous() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;

    let wrong = h.app.login("asiakas@example.fi", "vaarin!!").await.unwrap_err();
    let unknown = h.app.login("ei@example.fi", "salasana1").await.unwrap_err();
    assert_eq!(wrong.kind, NoticeKind::Error);
    // Same message for both so accounts cannot be probed.
    assert_eq!(wrong, unknown);
    assert_eq!(wrong.code, "invalid_credentials");
    assert_eq!(h.app.gate().state(), GateState::Anonymous);
}

#[tokio::test]
async fn signup_as_vendor_resolves_vendor_role() {
    let h = harness();
    let identity = h.app.signup("uusi@example.fi", "salasana1", true).await.unwrap();
    assert!(h.app.session().current().is_authenticated());

    let nav = h.app.navigate("/vendor-settings").await;
    assert_eq!(nav.decision, GateDecision::Render);
    assert_eq!(h.app.gate().state(), GateState::AuthenticatedRoleKnown { identity_id: identity.uid, role: Role::Vendor });
    assert_eq!(h.provider.outbox().len(), 1);
}

#[tokio::test]
async fn signup_with_taken_email_is_conflict() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;
    let notice = h.app.signup("asiakas@example.fi", "salasana1", false).await.unwrap_err();
    assert_eq!(notice.code, "identity_conflict");
}

#[tokio::test]
async fn profile_write_failure_keeps_identity_without_role() {
    let h = harness();
    h.profiles.fail_writes(true);
    let notice = h.app.signup("uusi@example.fi", "salasana1", true).await.unwrap_err();
    assert_eq!(notice.code, "profile_write_failure");
    assert!(h.app.session().current().is_authenticated());

    // No profile means no role, so role-gated views stay pending.
    assert_eq!(h.app.navigate("/vendor-dashboard").await.decision, GateDecision::Pending);
    assert_eq!(h.app.navigate("/customer/coins").await.decision, GateDecision::Render);
}

#[tokio::test]
async fn resend_without_session_makes_no_provider_call() {
    let h = harness();
    let before = h.provider.call_count();
    let notice = h.app.resend_verification().await.unwrap_err();
    assert_eq!(notice.code, AppError::NoActiveSession.code_str());
    assert_eq!(h.provider.call_count(), before);
    assert!(!h.app.verification_resent());
}

#[tokio::test]
async fn logout_twice_is_fine() {
    let h = harness();
    h.app.signup("uusi@example.fi", "salasana1", false).await.unwrap();
    let nav = h.app.logout().await.unwrap();
    assert_eq!(nav.shown, Some(Route::Home));
    h.app.logout().await.unwrap();
    assert!(!h.app.session().current().is_authenticated());
    assert_eq!(h.app.gate().state(), GateState::Anonymous);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_unknown_accounts() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;

    let known = h.app.forgot_password("asiakas@example.fi").await.unwrap();
    let unknown = h.app.forgot_password("ei@example.fi").await.unwrap();
    assert_eq!(known, unknown);
    assert_eq!(known.kind, NoticeKind::Info);

    let empty = h.app.forgot_password("  ").await.unwrap_err();
    assert_eq!(empty.code, "email_required");

    let resets: Vec<_> = h.provider.outbox().into_iter().filter(|e| e.kind == OutboxKind::PasswordReset).collect();
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].continue_url, "http://localhost:5173/auth/action");
}

#[tokio::test]
async fn forgot_password_reports_outage() {
    let h = harness();
    h.provider.set_offline(true);
    let notice = h.app.forgot_password("asiakas@example.fi").await.unwrap_err();
    assert_eq!(notice.code, "transient_failure");
}

#[tokio::test]
async fn verification_link_clears_banner() {
    let h = harness();
    h.app.signup("uusi@example.fi", "salasana1", false).await.unwrap();
    assert!(h.app.verification_banner_visible());

    h.app.resend_verification().await.unwrap();
    assert!(h.app.verification_resent());

    let code = h.provider.last_code_for("uusi@example.fi", OutboxKind::Verification).unwrap();
    let link = format!("/auth/action?mode=verifyEmail&oobCode={}", code);
    let nav = h.app.handle_action_link(&link, None).await.unwrap();
    assert_eq!(nav.shown, Some(Route::EmailVerified));
    assert!(h.app.session().current().email_verified);
    assert!(!h.app.verification_banner_visible());

    // Codes are single use.
    let again = h.app.handle_action_link(&link, None).await.unwrap_err();
    assert_eq!(again.kind, NoticeKind::Error);
}

#[tokio::test]
async fn dismissed_banner_stays_hidden() {
    let h = harness();
    h.app.signup("uusi@example.fi", "salasana1", false).await.unwrap();
    h.app.dismiss_verification_banner();
    assert!(!h.app.verification_banner_visible());
}

#[tokio::test]
async fn resend_state_clears_for_the_next_attempt() {
    let h = harness();
    h.app.signup("uusi@example.fi", "salasana1", false).await.unwrap();
    h.app.resend_verification().await.unwrap();
    assert!(h.app.verification_resent());

    h.app.dismiss_verification_banner();
    assert!(!h.app.verification_resent());

    h.app.resend_verification().await.unwrap();
    assert!(h.app.verification_resent());
    h.provider.set_offline(true);
    let notice = h.app.resend_verification().await.unwrap_err();
    assert_eq!(notice.code, "transient_failure");
    assert!(!h.app.verification_resent());
}

#[tokio::test]
async fn password_reset_link_sets_new_password() {
    let h = harness();
    register(&h, "asiakas@example.fi", false).await;
    h.app.forgot_password("asiakas@example.fi").await.unwrap();
    let code = h.provider.last_code_for("asiakas@example.fi", OutboxKind::PasswordReset).unwrap();
    let link = format!("http://localhost:5173/auth/action?mode=resetPassword&oobCode={}", code);

    assert!(h.app.handle_action_link(&link, None).await.is_err());
    let nav = h.app.handle_action_link(&link, Some("uusisalasana")).await.unwrap();
    assert_eq!(nav.shown, Some(Route::Login));

    assert!(h.app.login("asiakas@example.fi", "salasana1").await.is_err());
    h.app.login("asiakas@example.fi", "uusisalasana").await.unwrap();
}

#[tokio::test]
async fn support_dialog_needs_role_and_closes_on_navigation() {
    let h = harness();
    assert!(!h.app.open_support_dialog());

    h.app.signup("uusi@example.fi", "salasana1", false).await.unwrap();
    h.app.navigate("/customer/profile").await;
    assert!(h.app.open_support_dialog());
    assert!(h.app.support_dialog_open());

    h.app.navigate("/customer/appointments").await;
    assert!(!h.app.support_dialog_open());
}

#[tokio::test]
async fn session_is_resolved_before_views_mount() {
    let h = harness();
    let session = h.app.session().wait_until_resolved().await;
    assert!(!session.is_loading);
    assert!(h.app.is_ready());
    assert_eq!(h.provider.subscriber_count(), 1);

    h.app.shutdown();
    assert_eq!(h.provider.subscriber_count(), 0);
}

#[tokio::test]
async fn dropping_the_client_unsubscribes() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let profiles = Arc::new(MemoryProfileRepository::new());
    {
        let _app = BiloApp::start(AppConfig::default(), HostEnvironment::production(&AppConfig::default()), provider.clone(), profiles);
        assert_eq!(provider.subscriber_count(), 1);
    }
    assert_eq!(provider.subscriber_count(), 0);
}
