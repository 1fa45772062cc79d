//! Recipient notification: recipient rows plus SMTP fan-out.
//!
//! Sends use settled semantics: every recipient is attempted, failures are
//! collected per recipient, and the response reports how many of the total
//! succeeded so callers can retry only the failed subset.

use droply_core::models::recipient::{NotifyResponse, RecipientOutcome};
use droply_core::models::Transfer;
use droply_core::{AppError, Config};
use droply_db::RecipientRepository;
use futures::future::join_all;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use uuid::Uuid;

/// Thin SMTP wrapper. `None` when SMTP is not configured; the dispatcher
/// then records recipients but reports every send as failed.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    /// Build from config. Returns `None` when SMTP host or sender are absent.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port.unwrap_or(587);

        let mailer = if config.smtp_tls {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let builder = builder.port(port);
            let builder = if let (Some(user), Some(password)) =
                (config.smtp_user.clone(), config.smtp_password.clone())
            {
                builder.credentials(Credentials::new(user, password))
            } else {
                builder
            };
            tracing::info!(host = %host, port, "Email service initialized (SMTP with STARTTLS)");
            builder.build()
        } else {
            let builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let builder = if let (Some(user), Some(password)) =
                (config.smtp_user.clone(), config.smtp_password.clone())
            {
                builder.credentials(Credentials::new(user, password))
            } else {
                builder
            };
            tracing::info!(host = %host, port, "Email service initialized (SMTP)");
            builder.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    recipients: RecipientRepository,
    email: Option<EmailService>,
    base_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        recipients: RecipientRepository,
        email: Option<EmailService>,
        base_url: String,
    ) -> Self {
        Self {
            recipients,
            email,
            base_url,
        }
    }

    /// Share-page link carrying the per-recipient tracking identifier.
    fn share_link(&self, slug: &str, recipient_id: Uuid) -> String {
        format!("{}/s/{}?r={}", self.base_url, slug, recipient_id)
    }

    fn message_body(&self, transfer: &Transfer, recipient_id: Uuid, message: Option<&str>) -> String {
        let link = self.share_link(&transfer.slug, recipient_id);
        let mut body = String::new();
        if let Some(message) = message {
            body.push_str(message);
            body.push_str("\n\n");
        }
        body.push_str(&format!(
            "Files have been shared with you. Download them here:\n{}\n\nThis link expires on {}.\n",
            link,
            transfer.expires_at.format("%Y-%m-%d %H:%M UTC")
        ));
        if transfer.requires_password() {
            body.push_str("The sender protected this transfer with a password.\n");
        }
        body
    }

    /// Record and notify each recipient; one failure never stops the rest.
    #[tracing::instrument(skip(self, transfer, addresses, message), fields(transfer_id = %transfer.id))]
    pub async fn notify(
        &self,
        transfer: &Transfer,
        addresses: &[String],
        message: Option<&str>,
    ) -> Result<NotifyResponse, AppError> {
        if addresses.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one recipient is required".to_string(),
            ));
        }
        for address in addresses {
            if !address.contains('@') {
                return Err(AppError::InvalidInput(format!(
                    "'{}' is not a valid email address",
                    address
                )));
            }
        }

        // Insert the tracking rows first so every attempted send has one.
        let mut inserted = Vec::with_capacity(addresses.len());
        let mut outcomes = Vec::with_capacity(addresses.len());
        for address in addresses {
            match self.recipients.insert_sent(transfer.id, address).await {
                Ok(recipient) => inserted.push(recipient),
                Err(e) => {
                    tracing::error!(error = %e, email = %address, "Failed to record recipient");
                    outcomes.push(RecipientOutcome {
                        email: address.clone(),
                        delivered: false,
                        error: Some("Failed to record recipient".to_string()),
                    });
                }
            }
        }

        let sends = inserted.iter().map(|recipient| {
            let body = self.message_body(transfer, recipient.id, message);
            let email = self.email.clone();
            let address = recipient.email.clone();
            async move {
                let result = match email {
                    Some(service) => {
                        service
                            .send(&address, "Files shared with you via droply", &body)
                            .await
                    }
                    None => Err("SMTP is not configured".to_string()),
                };
                (address, result)
            }
        });

        for (address, result) in join_all(sends).await {
            match result {
                Ok(()) => outcomes.push(RecipientOutcome {
                    email: address,
                    delivered: true,
                    error: None,
                }),
                Err(error) => {
                    tracing::warn!(email = %address, error = %error, "Notification send failed");
                    outcomes.push(RecipientOutcome {
                        email: address,
                        delivered: false,
                        error: Some(error),
                    });
                }
            }
        }

        let sent = outcomes.iter().filter(|o| o.delivered).count();
        tracing::info!(sent, total = addresses.len(), "Notification batch finished");

        Ok(NotifyResponse {
            sent,
            total: addresses.len(),
            results: outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use droply_core::models::TransferStatus;
    use sqlx::postgres::PgPoolOptions;

    fn dispatcher() -> NotificationDispatcher {
        // Lazy pool: never connected by these tests.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgresql://localhost/droply_test")
            .expect("lazy pool");
        NotificationDispatcher::new(
            RecipientRepository::new(pool),
            None,
            "https://droply.example.com".to_string(),
        )
    }

    fn transfer() -> Transfer {
        Transfer {
            id: Uuid::new_v4(),
            slug: "abc123".to_string(),
            owner_id: Uuid::new_v4(),
            status: TransferStatus::Active.as_str().to_string(),
            total_bytes: 10,
            password_hash: Some("$argon2id$v=19$x".to_string()),
            expires_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn share_link_embeds_slug_and_tracking_id() {
        let dispatcher = dispatcher();
        let recipient_id = Uuid::new_v4();
        let link = dispatcher.share_link("abc123", recipient_id);
        assert_eq!(
            link,
            format!("https://droply.example.com/s/abc123?r={}", recipient_id)
        );
    }

    #[tokio::test]
    async fn body_mentions_password_when_protected() {
        let dispatcher = dispatcher();
        let transfer = transfer();
        let body = dispatcher.message_body(&transfer, Uuid::new_v4(), Some("See attached"));
        assert!(body.starts_with("See attached"));
        assert!(body.contains("/s/abc123?r="));
        assert!(body.contains("password"));
    }

    #[tokio::test]
    async fn empty_recipient_list_is_rejected() {
        let dispatcher = dispatcher();
        let transfer = transfer();
        let err = dispatcher
            .notify(&transfer, &[], None)
            .await
            .expect_err("empty list");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn malformed_address_is_rejected_before_any_insert() {
        let dispatcher = dispatcher();
        let transfer = transfer();
        let err = dispatcher
            .notify(&transfer, &["not-an-email".to_string()], None)
            .await
            .expect_err("invalid address");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
