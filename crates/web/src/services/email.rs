//! Email service for confirmation links.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. When no SMTP
//! server is configured the link is written to the log instead, which is how
//! development setups complete registrations.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use rosewood_core::{ConfirmAction, Email};

use crate::config::EmailConfig;

/// HTML template for a confirmation email.
#[derive(Template)]
#[template(path = "email/confirm.html")]
struct ConfirmEmailHtml<'a> {
    heading: &'a str,
    instruction: &'a str,
    link: &'a str,
}

/// Plain text template for a confirmation email.
#[derive(Template)]
#[template(path = "email/confirm.txt")]
struct ConfirmEmailText<'a> {
    heading: &'a str,
    instruction: &'a str,
    link: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Subject, heading and instruction line for each confirmation action.
const fn confirm_copy(action: ConfirmAction) -> (&'static str, &'static str, &'static str) {
    match action {
        ConfirmAction::Register => (
            "Activate your Rosewood account",
            "Welcome to Rosewood",
            "Follow the link below to activate your account.",
        ),
        ConfirmAction::ResetPassword => (
            "Reset your Rosewood password",
            "Password reset requested",
            "Follow the link below to choose a new password. Ignore this email if you did not ask for it.",
        ),
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a confirmation link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_confirmation(
        &self,
        to: &Email,
        link: &str,
        action: ConfirmAction,
    ) -> Result<(), EmailError> {
        let (subject, heading, instruction) = confirm_copy(action);
        let html = ConfirmEmailHtml {
            heading,
            instruction,
            link,
        }
        .render()?;
        let text = ConfirmEmailText {
            heading,
            instruction,
            link,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Deliver a confirmation link through `service`, or log it when mail is
/// not configured.
///
/// # Errors
///
/// Returns error if a configured service fails to send.
pub async fn deliver_confirmation(
    service: Option<&EmailService>,
    to: &Email,
    link: &str,
    action: ConfirmAction,
) -> Result<(), EmailError> {
    match service {
        Some(service) => service.send_confirmation(to, link, action).await,
        None => {
            tracing::warn!(
                to = %to,
                action = action.as_str(),
                link = %link,
                "SMTP not configured, confirmation link not sent"
            );
            Ok(())
        }
    }
}

/// Absolute confirmation link for a token.
#[must_use]
pub fn confirm_link(base_url: &str, token: &str, action: ConfirmAction) -> String {
    format!(
        "{}/user/verify?token={token}&action={}",
        base_url.trim_end_matches('/'),
        action.as_str()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_link() {
        assert_eq!(
            confirm_link("https://rosewood.test/", "ab12", ConfirmAction::Register),
            "https://rosewood.test/user/verify?token=ab12&action=register"
        );
        assert_eq!(
            confirm_link("http://localhost:3000", "ff", ConfirmAction::ResetPassword),
            "http://localhost:3000/user/verify?token=ff&action=reset_password"
        );
    }

    #[test]
    fn test_templates_include_link() {
        let (_, heading, instruction) = confirm_copy(ConfirmAction::Register);
        let link = "https://rosewood.test/user/verify?token=ab12&action=register";
        let html = ConfirmEmailHtml {
            heading,
            instruction,
            link,
        }
        .render()
        .unwrap();
        let text = ConfirmEmailText {
            heading,
            instruction,
            link,
        }
        .render()
        .unwrap();
        assert!(text.contains(link));
        assert!(html.contains("token=ab12"));
        assert!(html.contains(heading));
    }

    #[tokio::test]
    async fn test_deliver_without_smtp_is_ok() {
        let to = Email::parse("buyer@rosewood.test").unwrap();
        let result =
            deliver_confirmation(None, &to, "http://x/user/verify", ConfirmAction::Register).await;
        assert!(result.is_ok());
    }
}
