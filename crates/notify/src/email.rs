//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers expiration alerts as multipart (plain text + HTML) emails.
//! Supports STARTTLS and implicit TLS connections.

use chrono::{DateTime, Utc};
use lettre::{
    message::{Mailbox, MultiPart},
    Address,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use pharmatrack_core::config::SmtpConfig;
use pharmatrack_core::Drug;

use crate::templating::TemplateRenderer;
use crate::traits::{Notifier, NotifyError};

const DEFAULT_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;

/// Parse a recipient address the way outgoing alerts address it.
///
/// Accepts a bare address only. Surrounding whitespace is ignored.
pub fn parse_recipient(address: &str) -> Result<Mailbox, NotifyError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(NotifyError::InvalidRecipient(address.to_string()));
    }
    trimmed
        .parse::<Address>()
        .map(|email| Mailbox::new(None, email))
        .map_err(|_| NotifyError::InvalidRecipient(address.to_string()))
}

/// Sends expiration alerts as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
    renderer: TemplateRenderer,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// Port 465 always uses implicit TLS. Other ports use STARTTLS when
    /// `tls` is set, and plain SMTP otherwise. Credentials are attached
    /// when both username and password are present.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST is not set".to_string()))?;

        let from: Mailbox = config
            .from_mailbox()
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = config.port.unwrap_or(DEFAULT_PORT);

        let mut builder = if port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            renderer: TemplateRenderer::new()?,
        })
    }

    fn build_message(
        &self,
        address: &str,
        drugs: &[Drug],
        now: DateTime<Utc>,
    ) -> Result<Message, NotifyError> {
        let to = parse_recipient(address)?;
        let alert = self.renderer.render_alert(drugs, now)?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(alert.subject)
            .multipart(MultiPart::alternative_plain_html(alert.text, alert.html))
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, address: &str, drugs: &[Drug]) -> Result<(), NotifyError> {
        self.send_at(address, drugs, Utc::now()).await
    }

    /// Day counts in the message are relative to `now`.
    async fn send_at(
        &self,
        address: &str,
        drugs: &[Drug],
        now: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        let email = self.build_message(address, drugs, now)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            recipient = address,
            drugs = drugs.len(),
            "expiration alert delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn smtp(port: Option<u16>, tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port,
            username: Some("alerts@example.com".to_string()),
            password: Some("secret".to_string()),
            from_email: "alerts@example.com".to_string(),
            from_name: "Drug Expiry Manager".to_string(),
            tls,
        }
    }

    #[test]
    fn parse_email_with_display_name() {
        let mailbox: Mailbox = smtp(None, true).from_mailbox().parse().unwrap();
        assert_eq!(mailbox.email.to_string(), "alerts@example.com");
        assert_eq!(mailbox.name.as_deref(), Some("Drug Expiry Manager"));
    }

    #[test]
    fn from_config_valid() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true));
        assert!(notifier.is_ok());
    }

    #[test]
    fn from_config_missing_host() {
        let mut config = smtp(Some(587), true);
        config.host = None;
        let err = EmailNotifier::from_config(&config).unwrap_err().to_string();
        assert!(err.contains("Configuration error"), "got: {err}");
    }

    #[test]
    fn from_config_invalid_from_address() {
        let mut config = smtp(None, true);
        config.from_email = "bad-address".to_string();
        let result = EmailNotifier::from_config(&config);
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn from_config_implicit_tls_port() {
        assert!(EmailNotifier::from_config(&smtp(Some(465), true)).is_ok());
    }

    #[test]
    fn from_config_no_tls() {
        assert!(EmailNotifier::from_config(&smtp(Some(25), false)).is_ok());
    }

    #[test]
    fn channel_name_is_email() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true)).unwrap();
        assert_eq!(notifier.channel_name(), "email");
        assert!(notifier.is_enabled());
    }

    #[tokio::test]
    async fn empty_recipient_fails_before_transport() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true)).unwrap();
        let result = notifier.send("", &[]).await;
        assert!(matches!(result, Err(NotifyError::InvalidRecipient(_))));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true)).unwrap();
        let result = notifier.build_message("not-an-email", &[], Utc::now());
        assert!(matches!(result, Err(NotifyError::InvalidRecipient(_))));
    }

    #[test]
    fn message_is_addressed_to_recipient() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true)).unwrap();
        let message = notifier
            .build_message("ops@pharmacy.example", &[], Utc::now())
            .unwrap();
        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "ops@pharmacy.example");
        assert_eq!(
            envelope.from().map(|a| a.to_string()).as_deref(),
            Some("alerts@example.com")
        );
    }

    fn drug(brand: &str, expiration: &str) -> Drug {
        Drug {
            id: 1,
            generic_name: "amoxicillin".to_string(),
            brand_name: brand.to_string(),
            manufacturer: "Acme".to_string(),
            batch_number: "AX-1".to_string(),
            expiration_date: expiration.to_string(),
            dosage_form: "capsule".to_string(),
            strength: "250mg".to_string(),
            quantity: 20,
            storage_conditions: "cool".to_string(),
            packaging: "bottle".to_string(),
            composition: "amoxicillin".to_string(),
            indication: None,
            contraindications: None,
            side_effects: None,
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn day_counts_follow_the_given_instant() {
        let notifier = EmailNotifier::from_config(&smtp(Some(587), true)).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let message = notifier
            .build_message("ops@pharmacy.example", &[drug("Amoxil", "2024-01-15")], now)
            .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("expires 2024-01-15, 14 days"), "got: {raw}");
    }

    #[test]
    fn parse_recipient_accepts_plain_addresses() {
        let mailbox = parse_recipient("  ops@pharmacy.example ").unwrap();
        assert_eq!(mailbox.email.to_string(), "ops@pharmacy.example");
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn parse_recipient_rejects_what_the_transport_cannot_address() {
        for bad in ["", "   ", "bad(local@example.com", "semi;colon@example.com", "Ops <ops@pharmacy.example>"] {
            assert!(
                matches!(parse_recipient(bad), Err(NotifyError::InvalidRecipient(_))),
                "accepted {bad:?}"
            );
        }
    }
}
