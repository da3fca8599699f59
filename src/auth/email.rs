//! # Outbound Email
//!
//! The notifier seam. Templates are rendered here; delivery goes through
//! [`EmailSender`] so the service never knows whether a real SMTP relay or
//! the log-only sender is behind it.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use super::errors::{AuthError, AuthResult};

// ==================
// Templates
// ==================

/// Rendered notification kinds
#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    /// Sent once after registration
    Welcome { name: String, email: String },
    /// Carries an account-verification code
    VerifyOtp { code: String, expires_hours: i64 },
    /// Carries a password-reset code
    ResetOtp { code: String, expires_minutes: i64 },
}

impl EmailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome { .. } => "Welcome to postern",
            EmailTemplate::VerifyOtp { .. } => "Your account verification code",
            EmailTemplate::ResetOtp { .. } => "Your password reset code",
        }
    }

    pub fn body(&self) -> String {
        match self {
            EmailTemplate::Welcome { name, email } => format!(
                "Hello {},\n\nYour account has been created with the email address {}.\n",
                name, email
            ),
            EmailTemplate::VerifyOtp {
                code,
                expires_hours,
            } => format!(
                "Your verification code is {}.\n\nEnter it to verify your account. The code expires in {} hours.\n",
                code, expires_hours
            ),
            EmailTemplate::ResetOtp {
                code,
                expires_minutes,
            } => format!(
                "Your password reset code is {}.\n\nThe code expires in {} minutes. If you did not request a reset, ignore this email.\n",
                code, expires_minutes
            ),
        }
    }
}

// ==================
// Sender Trait
// ==================

/// Email delivery interface
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, template: EmailTemplate) -> AuthResult<()>;
}

/// Deliver a notification without blocking the caller.
///
/// Account state has already been persisted by the time this runs, so a
/// delivery failure is logged and dropped rather than surfaced.
pub fn dispatch(sender: Arc<dyn EmailSender>, to: String, template: EmailTemplate) {
    tokio::spawn(async move {
        if let Err(e) = sender.send(&to, template).await {
            tracing::warn!(recipient = %to, error = %e, "email delivery failed");
        }
    });
}

// ==================
// SMTP Sender
// ==================

/// Delivers through an SMTP relay (lettre, async, rustls)
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build a sender for a TLS relay. Credentials are skipped when
    /// `username` is empty (open relays on private networks).
    pub fn new(
        relay: &str,
        port: Option<u16>,
        username: &str,
        password: &str,
        from: &str,
    ) -> AuthResult<Self> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Notify(format!("Invalid from address '{}': {}", from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|e| AuthError::Notify(format!("Invalid SMTP relay '{}': {}", relay, e)))?;
        if let Some(port) = port {
            builder = builder.port(port);
        }
        if !username.is_empty() {
            builder = builder.credentials(Credentials::new(
                username.to_string(),
                password.to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, template: EmailTemplate) -> AuthResult<()> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Notify(format!("Invalid recipient '{}': {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(template.subject())
            .body(template.body())
            .map_err(|e| AuthError::Notify(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::Notify(format!("SMTP send failed: {}", e)))?;
        Ok(())
    }
}

// ==================
// Log Sender
// ==================

/// Writes notifications to the log instead of delivering them.
///
/// The default when SMTP is not configured, so the service works out of
/// the box and the codes are still reachable by an operator.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, template: EmailTemplate) -> AuthResult<()> {
        tracing::info!(
            recipient = %to,
            subject = %template.subject(),
            body = %template.body(),
            "email (log-only delivery)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_template_carries_code() {
        let template = EmailTemplate::VerifyOtp {
            code: "004217".to_string(),
            expires_hours: 24,
        };
        assert!(template.body().contains("004217"));
        assert!(template.body().contains("24 hours"));
    }

    #[test]
    fn test_reset_template_carries_code() {
        let template = EmailTemplate::ResetOtp {
            code: "990001".to_string(),
            expires_minutes: 15,
        };
        assert!(template.body().contains("990001"));
        assert!(template.body().contains("15 minutes"));
    }

    #[test]
    fn test_welcome_template_names_account() {
        let template = EmailTemplate::Welcome {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert!(template.body().contains("Ada"));
        assert!(template.body().contains("ada@example.com"));
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let sender = LogEmailSender;
        let result = sender
            .send(
                "someone@example.com",
                EmailTemplate::VerifyOtp {
                    code: "123456".to_string(),
                    expires_hours: 24,
                },
            )
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_smtp_sender_rejects_bad_from_address() {
        let err = SmtpEmailSender::new("smtp.example.com", None, "", "", "not an address");
        assert!(matches!(err, Err(AuthError::Notify(_))));
    }
}
