//! Postdeck Email Service
//!
//! Provides email functionality for the invitation workflow:
//! - Invitation email templates (text + HTML)
//! - Mock email service that captures messages for tests and development
//!
//! Real delivery is a future integration point. The factory only produces
//! the mock implementation; invitation flows remain fully functional because
//! the invite link is also returned through the API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod content;
pub mod mock;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("Email delivery error: {0}")]
    Delivery(String),
}

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl EmailMessage {
    /// Create a new email message
    pub fn new(to: String, from: String, subject: String, body_text: String) -> Self {
        Self {
            to,
            from,
            reply_to: None,
            subject,
            body_text,
            body_html: None,
            metadata: HashMap::new(),
        }
    }

    /// Add HTML body content
    pub fn with_html(mut self, body_html: String) -> Self {
        self.body_html = Some(body_html);
        self
    }

    /// Add reply-to address
    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Add metadata for tracking
    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }
}

/// Email delivery receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
    pub provider: String,
    pub metadata: HashMap<String, String>,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Default from address
    pub default_from: String,
    /// Enable email sending (can disable for testing)
    pub enabled: bool,
}

impl EmailConfig {
    /// Create email config from environment variables
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        let default_from =
            std::env::var("FROM_EMAIL").unwrap_or_else(|_| "invitations@postdeck.io".to_string());

        let enabled = std::env::var("EMAIL_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            default_from,
            enabled,
        })
    }
}

/// Email service trait for different implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    /// Send an email message
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Return the default "from" address for outgoing emails
    fn default_from(&self) -> String;

    /// Send a team invitation email.
    ///
    /// `invite_link` is the full public URL carrying the invitation token;
    /// the caller builds it from the configured site origin.
    async fn send_team_invitation(
        &self,
        team_name: &str,
        invitation_id: Uuid,
        recipient_email: &str,
        inviter_name: &str,
        role: &str,
        invite_link: &str,
    ) -> Result<EmailReceipt, EmailError> {
        let subject = format!("Invitation to join team: {}", team_name);
        let body_text = content::team_invitation_text(inviter_name, team_name, role, invite_link);
        let body_html = content::team_invitation_html(inviter_name, team_name, role, invite_link);

        let message = EmailMessage::new(
            recipient_email.to_string(),
            self.default_from(),
            subject,
            body_text,
        )
        .with_html(body_html)
        .with_metadata("email_type".to_string(), "team_invitation".to_string())
        .with_metadata("invitation_id".to_string(), invitation_id.to_string())
        .with_metadata("invite_link".to_string(), invite_link.to_string())
        .with_metadata("role".to_string(), role.to_string());

        self.send_email(message).await
    }
}

/// Email service factory
pub struct EmailServiceFactory;

impl EmailServiceFactory {
    /// Create email service based on configuration.
    ///
    /// Only the capturing mock exists today; a transactional provider would
    /// be registered here once delivery is wired up.
    pub fn create(config: EmailConfig) -> Box<dyn EmailService> {
        if !config.enabled {
            tracing::info!("Email sending disabled, using disabled mock implementation");
            return Box::new(mock::MockEmailService::new_disabled_with_from(
                config.default_from,
            ));
        }

        tracing::info!("Creating mock email service");
        Box::new(mock::MockEmailService::with_from(config.default_from))
    }
}
