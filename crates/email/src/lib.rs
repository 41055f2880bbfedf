//! Gatehouse Email Service
//!
//! Provides email delivery for account workflows with support for:
//! - AWS SES integration for production email delivery
//! - Mock email service for testing and development
//! - LocalStack integration for local E2E testing
//! - Registration verification templates

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aws_ses;
pub mod content;
pub mod mock;

pub use content::{EmailTemplate, RegistrationEmail, REGISTRATION_SUBJECT};

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
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

/// Delivery backend selected by `EMAIL_PROVIDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Ses,
    Mock,
}

impl FromStr for EmailProvider {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ses" | "aws-ses" => Ok(Self::Ses),
            "mock" => Ok(Self::Mock),
            other => Err(EmailError::Configuration(format!(
                "Unknown email provider: {}. Supported providers: ses, mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub aws_region: Option<String>,
    /// LocalStack or other SES-compatible endpoint
    pub aws_endpoint_url: Option<String>,
    pub default_from: String,
    /// When false every provider falls back to the capturing mock
    pub enabled: bool,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("EMAIL_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => EmailProvider::Mock,
        };
        let enabled = match std::env::var("EMAIL_ENABLED") {
            Ok(value) => value.parse().map_err(|_| {
                EmailError::Configuration(format!("EMAIL_ENABLED must be a boolean: {}", value))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            provider,
            aws_region: std::env::var("AWS_REGION").ok(),
            aws_endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            default_from: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@gatehouse.local".to_string()),
            enabled,
        })
    }

    /// Provider actually used once `enabled` is taken into account
    pub fn effective_provider(&self) -> EmailProvider {
        if self.enabled {
            self.provider
        } else {
            EmailProvider::Mock
        }
    }
}

/// Email service trait for different implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    /// Send an email message
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Return the default "from" address for outgoing emails
    fn default_from(&self) -> String;

    /// Short provider name for logs
    fn service_name(&self) -> &'static str;

    /// Render `template` and send it to `to` under `subject`
    async fn send_template(
        &self,
        subject: &str,
        to: &str,
        template: &EmailTemplate,
    ) -> Result<EmailReceipt, EmailError> {
        let message = EmailMessage::new(
            to.to_string(),
            self.default_from(),
            subject.to_string(),
            template.render_text(),
        )
        .with_html(template.render_html())
        .with_metadata("email_type".to_string(), template.kind().to_string());

        self.send_email(message).await
    }
}

/// Email service factory
pub struct EmailServiceFactory;

impl EmailServiceFactory {
    pub async fn create(config: EmailConfig) -> Result<Arc<dyn EmailService>, EmailError> {
        let provider = config.effective_provider();
        tracing::info!(?provider, enabled = config.enabled, "Creating email service");

        match provider {
            EmailProvider::Ses => Ok(Arc::new(aws_ses::SesEmailService::new(config).await?)),
            EmailProvider::Mock => Ok(Arc::new(mock::MockEmailService::new())),
        }
    }
}
