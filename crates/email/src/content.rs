//! Shared email content templates
//!
//! Canonical content generators for account emails, used by both
//! production (SES) and mock email services.

use serde::{Deserialize, Serialize};

/// Subject line of the registration verification email
pub const REGISTRATION_SUBJECT: &str = "Verify your email address";

/// Data for the registration verification email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEmail {
    pub fullname: String,
    pub link: String,
    pub app_name: String,
}

/// A renderable email body together with its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    Registration(RegistrationEmail),
}

impl EmailTemplate {
    /// Stable identifier recorded in message metadata
    pub fn kind(&self) -> &'static str {
        match self {
            EmailTemplate::Registration(_) => "registration",
        }
    }

    pub fn render_text(&self) -> String {
        match self {
            EmailTemplate::Registration(data) => registration_text(data),
        }
    }

    pub fn render_html(&self) -> String {
        match self {
            EmailTemplate::Registration(data) => registration_html(data),
        }
    }
}

/// Generate plain-text body for the registration verification email.
pub fn registration_text(data: &RegistrationEmail) -> String {
    format!(
        "Hi {}!\n\n\
        Thanks for signing up for {}.\n\n\
        Please confirm your email address by opening the link below:\n\
        {}\n\n\
        This link will expire in 24 hours.\n\n\
        If you didn't create an account, you can safely ignore this email.\n\n\
        Thanks,\n\
        The {} Team",
        data.fullname, data.app_name, data.link, data.app_name
    )
}

/// Generate styled HTML body for the registration verification email.
pub fn registration_html(data: &RegistrationEmail) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #007cba;">Welcome to {app_name}!</h2>

                    <p>Hi <strong>{fullname}</strong>,</p>

                    <p>Thanks for signing up. Please confirm your email address to activate your account.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{link}"
                           style="background-color: #007cba; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            Verify Email
                        </a>
                    </div>

                    <p>Or copy and paste this link in your browser:</p>
                    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
                        <a href="{link}">{link}</a>
                    </p>

                    <p style="color: #666; font-size: 14px;">
                        <em>This link will expire in 24 hours.</em>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">

                    <p style="color: #666; font-size: 12px;">
                        If you didn't create an account, you can safely ignore this email.<br>
                        Thanks, The {app_name} Team
                    </p>
                </div>
            </body>
            </html>
            "#,
        app_name = escape_html(&data.app_name),
        fullname = escape_html(&data.fullname),
        link = escape_html(&data.link)
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
