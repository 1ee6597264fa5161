//! Mock Email Service Implementation
//!
//! Provides in-memory email capture for testing without external
//! dependencies. Invitation emails can be inspected by recipient, and the
//! invite link is exposed as structured metadata.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EmailError, EmailMessage, EmailReceipt, EmailService};

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    /// Invitation ID carried in the message metadata, if any
    pub fn invitation_id(&self) -> Option<Uuid> {
        self.message
            .metadata
            .get("invitation_id")
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Invite link carried in the message metadata, if any
    pub fn invite_link(&self) -> Option<&str> {
        self.message.metadata.get("invite_link").map(String::as_str)
    }
}

/// Mock email service for testing
#[derive(Debug, Clone)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
    default_from: String,
    enabled: bool,
}

impl MockEmailService {
    /// Create a new mock email service
    pub fn new() -> Self {
        Self::with_from("invitations@postdeck.io".to_string())
    }

    /// Create a mock email service with a custom from address
    pub fn with_from(default_from: String) -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            default_from,
            enabled: true,
        }
    }

    /// Create a disabled mock email service (for testing)
    pub fn new_disabled() -> Self {
        Self::new_disabled_with_from("invitations@postdeck.io".to_string())
    }

    /// Create a disabled mock with a custom from address
    pub fn new_disabled_with_from(default_from: String) -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            default_from,
            enabled: false,
        }
    }

    /// Get all captured emails
    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        self.emails.lock().unwrap().clone()
    }

    /// Get emails sent to a specific recipient
    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        self.email_by_recipient
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the most recent invitation email for a recipient
    pub fn get_latest_invitation_email(&self, email: &str) -> Option<CapturedEmail> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| {
                e.message
                    .metadata
                    .get("email_type")
                    .map(|t| t == "team_invitation")
                    .unwrap_or(false)
            })
            .max_by_key(|e| e.captured_at)
    }

    /// Check if an invitation email was sent to a specific email address
    pub fn was_invitation_sent_to(&self, email: &str) -> bool {
        self.get_latest_invitation_email(email).is_some()
    }

    /// Get count of emails sent
    pub fn email_count(&self) -> usize {
        self.emails.lock().unwrap().len()
    }

    /// Clear all captured emails
    pub fn clear(&self) {
        self.emails.lock().unwrap().clear();
        self.email_by_recipient.lock().unwrap().clear();
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if !self.enabled {
            tracing::warn!("Mock email service disabled, skipping send");
            return Ok(EmailReceipt {
                message_id: format!("disabled-{}", Uuid::new_v4()),
                sent_at: Utc::now(),
                provider: "mock-disabled".to_string(),
                metadata: message.metadata.clone(),
            });
        }

        tracing::info!(to = %message.to, "Mock email service capturing email");

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: "mock".to_string(),
            metadata: message.metadata.clone(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        // Store email in global list
        self.emails.lock().unwrap().push(captured.clone());

        // Store email by recipient for easy lookup
        self.email_by_recipient
            .lock()
            .unwrap()
            .entry(message.to)
            .or_default()
            .push(captured);

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        self.default_from.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_email_service() {
        let service = MockEmailService::new();

        let message = EmailMessage::new(
            "test@example.com".to_string(),
            "sender@postdeck.io".to_string(),
            "Test Subject".to_string(),
            "Test body".to_string(),
        );

        let receipt = service.send_email(message).await.unwrap();

        assert!(receipt.message_id.starts_with("mock-"));
        assert_eq!(receipt.provider, "mock");
        assert_eq!(service.email_count(), 1);

        let emails = service.get_emails_for_recipient("test@example.com");
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].message.subject, "Test Subject");
    }

    #[tokio::test]
    async fn test_team_invitation_email() {
        let service = MockEmailService::new();
        let invitation_id = Uuid::new_v4();
        let invite_link = "https://app.postdeck.io/invite/abc123";

        let receipt = service
            .send_team_invitation(
                "Test Team",
                invitation_id,
                "invitee@example.com",
                "Inviter User",
                "member",
                invite_link,
            )
            .await
            .unwrap();

        assert_eq!(receipt.provider, "mock");

        let captured = service
            .get_latest_invitation_email("invitee@example.com")
            .unwrap();
        assert_eq!(captured.invitation_id(), Some(invitation_id));
        assert_eq!(captured.invite_link(), Some(invite_link));
        assert!(captured.message.body_text.contains(invite_link));
        assert!(captured.message.subject.contains("Test Team"));

        assert!(service.was_invitation_sent_to("invitee@example.com"));
        assert!(!service.was_invitation_sent_to("someone-else@example.com"));
    }

    #[tokio::test]
    async fn test_disabled_mock_service() {
        let service = MockEmailService::new_disabled();

        let message = EmailMessage::new(
            "test@example.com".to_string(),
            "sender@postdeck.io".to_string(),
            "Test Subject".to_string(),
            "Test body".to_string(),
        );

        let receipt = service.send_email(message).await.unwrap();

        assert!(receipt.message_id.starts_with("disabled-"));
        assert_eq!(receipt.provider, "mock-disabled");
        assert_eq!(service.email_count(), 0); // Email not captured when disabled
    }

    #[tokio::test]
    async fn test_clear_resets_capture_state() {
        let service = MockEmailService::new();
        let message = EmailMessage::new(
            "a@example.com".to_string(),
            "sender@postdeck.io".to_string(),
            "Subject".to_string(),
            "Body".to_string(),
        );
        service.send_email(message).await.unwrap();
        assert_eq!(service.email_count(), 1);

        service.clear();
        assert_eq!(service.email_count(), 0);
        assert!(service.get_emails_for_recipient("a@example.com").is_empty());
    }
}
