//! AWS SES delivery
//!
//! Sends rendered account emails through Simple Email Service. Setting
//! `AWS_ENDPOINT_URL` points the client at LocalStack with static
//! credentials instead of the default provider chain.

use std::collections::HashMap;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_ses::config::SharedCredentialsProvider;
use aws_sdk_ses::error::DisplayErrorContext;
use aws_sdk_ses::types::{Body, Content, Destination, Message, MessageTag};
use aws_sdk_ses::Client as SesClient;
use chrono::Utc;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

const DEFAULT_REGION: &str = "us-east-1";
const CHARSET: &str = "UTF-8";

/// AWS SES email service implementation
pub struct SesEmailService {
    client: SesClient,
    default_from: String,
}

impl SesEmailService {
    pub async fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let sdk_config = load_sdk_config(&config).await;

        Ok(Self {
            client: SesClient::new(&sdk_config),
            default_from: config.default_from,
        })
    }
}

async fn load_sdk_config(config: &EmailConfig) -> SdkConfig {
    let region = Region::new(
        config
            .aws_region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
    );
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    match config.aws_endpoint_url.as_deref() {
        Some(endpoint_url) => {
            tracing::info!(endpoint_url, "Using custom SES endpoint");
            let credentials = Credentials::new(
                "test-access-key",
                "test-secret-key",
                None,
                None,
                "gatehouse-localstack",
            );
            loader
                .endpoint_url(endpoint_url)
                .credentials_provider(SharedCredentialsProvider::new(credentials))
                .load()
                .await
        }
        None => loader.load().await,
    }
}

/// Reject addresses SES would bounce outright
fn validate_address(address: &str) -> Result<(), EmailError> {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(EmailError::Validation(format!(
            "Invalid email address: {}",
            address
        ))),
    }
}

fn utf8(data: &str, part: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|e| EmailError::AwsSes(format!("Failed to build {}: {}", part, e)))
}

fn ses_message(message: &EmailMessage) -> Result<Message, EmailError> {
    let mut body = Body::builder().text(utf8(&message.body_text, "text body")?);
    if let Some(html) = &message.body_html {
        body = body.html(utf8(html, "HTML body")?);
    }

    Ok(Message::builder()
        .subject(utf8(&message.subject, "subject")?)
        .body(body.build())
        .build())
}

/// SES tags only accept ASCII alphanumerics, `_` and `-`; other metadata
/// entries are left off the message
fn message_tags(metadata: &HashMap<String, String>) -> Vec<MessageTag> {
    let allowed = |s: &str| {
        !s.is_empty()
            && s.len() <= 256
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };

    let mut tags: Vec<MessageTag> = metadata
        .iter()
        .filter(|(name, value)| allowed(name) && allowed(value))
        .filter_map(|(name, value)| MessageTag::builder().name(name).value(value).build().ok())
        .collect();
    tags.sort_by(|a, b| a.name().cmp(b.name()));
    tags
}

#[async_trait::async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        validate_address(&message.to)?;
        validate_address(&message.from)?;

        let request = self
            .client
            .send_email()
            .source(&message.from)
            .destination(Destination::builder().to_addresses(&message.to).build())
            .message(ses_message(&message)?)
            .set_tags(Some(message_tags(&message.metadata)));

        let output = request.send().await.map_err(|e| {
            match e.as_service_error() {
                Some(service) if service.is_message_rejected() => {
                    EmailError::Delivery(service.to_string())
                }
                _ => EmailError::AwsSes(DisplayErrorContext(&e).to_string()),
            }
        })?;

        let message_id = output.message_id().to_string();
        tracing::info!(message_id = %message_id, to = %message.to, "Email sent via SES");

        Ok(EmailReceipt {
            message_id,
            sent_at: Utc::now(),
            provider: self.service_name().to_string(),
            metadata: message.metadata,
        })
    }

    fn default_from(&self) -> String {
        self.default_from.clone()
    }

    fn service_name(&self) -> &'static str {
        "aws-ses"
    }
}
