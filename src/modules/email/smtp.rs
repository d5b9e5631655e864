use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use super::Mailer;

/// Structure to hold SMTP credentials with metadata
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmtpCredentials {
    // The email address/username for SMTP authentication
    pub username: String,
    // The password or app-specific password for SMTP
    pub password: String,
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (typically 587 for TLS)
    pub port: u16,
}

/// Mailer backed by an authenticated SMTP relay
pub struct SmtpMailer {
    credentials: SmtpCredentials,
    sender_name: String,
}

impl SmtpMailer {
    pub fn new(credentials: SmtpCredentials) -> Self {
        Self {
            credentials,
            sender_name: "Wayfarer Travel Support".to_string(),
        }
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let creds = &self.credentials;

        // Create email message
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.sender_name, creds.username)
                    .parse()
                    .map_err(|e| format!("Invalid from address: {}", e))?,
            )
            .to(to
                .parse()
                .map_err(|e| format!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(lettre::message::header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| format!("Failed to create email: {}", e))?;

        // Configure TLS parameters
        let tls_parameters = TlsParameters::builder(creds.host.clone())
            .build()
            .map_err(|e| format!("Failed to build TLS parameters: {}", e))?;

        // Set up SMTP transport with explicit TLS configuration
        let mailer = SmtpTransport::relay(&creds.host)
            .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
            .credentials(Credentials::new(
                creds.username.clone(),
                creds.password.clone(),
            ))
            .port(creds.port)
            .tls(Tls::Required(tls_parameters))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        // Send the email
        match mailer.send(&email) {
            Ok(_) => {
                log::info!("Email sent successfully to recipient");
                Ok(())
            }
            Err(e) => Err(format!("Failed to send email: {}", e)),
        }
    }
}

/// Development fallback used by the CLI when no SMTP configuration is
/// present: the message is printed so the operator can grab the reset link.
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        log::info!("Console mailer delivering to {}", to);
        println!("--- email to {} ---", to);
        println!("Subject: {}", subject);
        println!("{}", body);
        println!("--- end email ---");
        Ok(())
    }
}
