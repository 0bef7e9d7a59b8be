use std::sync::Arc;

use tracing::{info, warn};

use super::email::{EmailMessage, EmailTransport};
use super::templates;
use crate::error::AppResult;
use crate::models::{Appointment, UserSummary, Vendor};

/// Sends the marketplace's transactional mail. Each call is one delivery attempt whose
/// result goes back to the caller, who decides whether the user hears about a failure.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn EmailTransport>,
    from: String,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn EmailTransport>, from: impl Into<String>) -> Self {
        Self { transport, from: from.into() }
    }

    async fn deliver(&self, kind: &'static str, to: &str, subject: &str, html: String) -> AppResult<()> {
        let message = EmailMessage { from: self.from.clone(), to: to.to_string(), subject: subject.to_string(), html };
        match self.transport.send(&message).await {
            Ok(()) => {
                info!(target: "bilo::email", kind, to = %to, "notification sent");
                Ok(())
            }
            Err(e) => {
                warn!(target: "bilo::email", kind, to = %to, error = %e, "notification not delivered");
                Err(e)
            }
        }
    }

    pub async fn send_appointment_confirmation(&self, appointment: &Appointment, vendor: &Vendor) -> AppResult<()> {
        let html = templates::appointment_confirmation(appointment, vendor);
        self.deliver("confirmation", &appointment.customer_details.email, "Varauksesi on vahvistettu", html).await
    }

    pub async fn send_appointment_reminder(&self, appointment: &Appointment, vendor: &Vendor) -> AppResult<()> {
        let html = templates::appointment_reminder(appointment, vendor);
        self.deliver("reminder", &appointment.customer_details.email, "Muistutus huomisesta varauksesta", html).await
    }

    pub async fn send_welcome(&self, user: &UserSummary) -> AppResult<()> {
        self.deliver("welcome", &user.email, "Tervetuloa Biloon", templates::welcome(user)).await
    }

    pub async fn send_vendor_notification(&self, vendor: &Vendor, subject: &str, message: &str) -> AppResult<()> {
        self.deliver("vendor_notice", &vendor.email, subject, templates::vendor_notice(message)).await
    }
}
