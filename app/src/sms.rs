//! Order confirmation texts through a Twilio-compatible REST API.
//!
//! Delivery is best effort: callers record the outcome and carry on.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::config::SmsConfig;

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS provider not configured")]
    NotConfigured,

    #[error("No destination phone provided")]
    NoDestination,

    #[error("No FROM or Messaging Service configured")]
    NoSender,

    #[error("SMS provider rejected message: {0}")]
    Provider(String),

    #[error("SMS transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub to: String,
    pub sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    sid: Option<String>,
    message: Option<String>,
    code: Option<i64>,
}

#[derive(Clone)]
pub struct SmsClient {
    config: Arc<SmsConfig>,
    http: reqwest::Client,
}

impl SmsClient {
    pub fn new(config: SmsConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds());
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        if config.credentials().is_none() {
            tracing::warn!("SMS credentials missing; order confirmations will not be sent");
        }

        Ok(SmsClient {
            config: Arc::new(config),
            http,
        })
    }

    /// Ten bare digits are treated as a local mobile number and get the default
    /// country code; anything else lacking a `+` is reduced to digits and prefixed.
    pub fn normalize_phone(&self, raw: &str) -> String {
        normalize_phone(raw, self.config.default_country_code())
    }

    pub async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let (sid, token) = self.config.credentials().ok_or(SmsError::NotConfigured)?;

        if to.trim().is_empty() {
            return Err(SmsError::NoDestination);
        }
        let to = self.normalize_phone(to);

        let mut form = vec![("To", to.clone()), ("Body", body.to_string())];
        if let Some(service_sid) = self.config.messaging_service_sid() {
            form.push(("MessagingServiceSid", service_sid.to_string()));
        } else if let Some(from) = self.config.from_number() {
            form.push(("From", from.to_string()));
        } else {
            return Err(SmsError::NoSender);
        }

        let endpoint = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_base().trim_end_matches('/'),
            sid
        );

        let response = self
            .http
            .post(endpoint)
            .basic_auth(sid, Some(token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let reply: ProviderReply = response.json().await?;

        if !status.is_success() {
            let message = reply.message.unwrap_or_else(|| status.to_string());
            return Err(SmsError::Provider(match reply.code {
                Some(code) => format!("{message} (code {code})"),
                None => message,
            }));
        }

        tracing::info!(to = %to, "sms sent");

        Ok(SmsReceipt { to, sid: reply.sid })
    }
}

fn normalize_phone(raw: &str, default_country_code: &str) -> String {
    let to = raw.trim();

    if to.len() == 10 && to.chars().all(|c| c.is_ascii_digit()) {
        return format!("{default_country_code}{to}");
    }

    if !to.starts_with('+') && default_country_code.starts_with('+') {
        let digits: String = to.chars().filter(char::is_ascii_digit).collect();
        return format!("{default_country_code}{digits}");
    }

    to.to_string()
}
