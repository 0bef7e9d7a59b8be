//! Transactional email: templates, the dispatcher and the delivery transport.

mod email;
mod dispatcher;
pub mod templates;

pub use email::{EmailMessage, EmailTransport, MailgunTransport};
pub use dispatcher::NotificationDispatcher;
