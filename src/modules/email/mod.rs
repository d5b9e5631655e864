mod smtp;
mod templates;

pub use smtp::{ConsoleMailer, SmtpCredentials, SmtpMailer};
pub use templates::password_reset_email;

/// Outbound notification channel. The orchestrator treats sending as
/// fire-and-forget: a failure here is logged but never rolls back the work
/// that triggered the message.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}
