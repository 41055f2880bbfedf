//! Mock Email Service Implementation
//!
//! Provides in-memory email capture for testing without external dependencies.
//! Captured verification emails expose the token embedded in their link so
//! tests can complete the sign-up workflow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
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
    /// Extract the `token` query value from the first link in the body
    pub fn extract_token(&self) -> Option<String> {
        let text = format!(
            "{} {}",
            self.message.body_text,
            self.message.body_html.as_deref().unwrap_or("")
        );

        let re = regex::Regex::new(r"[?&]token=([A-Za-z0-9_\-\.]+)").ok()?;
        re.captures(&text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn email_type(&self) -> Option<&str> {
        self.message.metadata.get("email_type").map(String::as_str)
    }
}

/// Mock email service
#[derive(Clone)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
    failing: Arc<AtomicBool>,
}

impl MockEmailService {
    /// Create a new mock email service
    pub fn new() -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent send fail with `EmailError::Delivery`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
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

    /// Get the most recent registration email for a recipient
    pub fn get_latest_registration_email(&self, email: &str) -> Option<CapturedEmail> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| e.email_type() == Some("registration"))
            .max_by_key(|e| e.captured_at)
    }

    /// Verification token from the most recent registration email
    pub fn get_verification_token_for(&self, email: &str) -> Option<String> {
        self.get_latest_registration_email(email)
            .and_then(|email| email.extract_token())
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
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            tracing::warn!(to = %message.to, "Mock email service failing, rejecting send");
            return Err(EmailError::Delivery(
                "mock delivery failure".to_string(),
            ));
        }

        tracing::info!("Mock email service capturing email to: {}", message.to);

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

        tracing::info!(
            "Email captured successfully, message ID: {}",
            receipt.message_id
        );

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        "no-reply@gatehouse.local".to_string()
    }

    fn service_name(&self) -> &'static str {
        "mock"
    }
}
