use serde::Deserialize;

pub const DEFAULT_SMS_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub messaging_service_sid: Option<String>,
    pub default_country_code: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub api_base: Option<String>,
}

impl SmsConfig {
    /// Both account sid and token are needed to talk to the provider.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.account_sid.as_deref(), self.auth_token.as_deref()) {
            (Some(sid), Some(token)) if !sid.is_empty() && !token.is_empty() => Some((sid, token)),
            _ => None,
        }
    }

    pub fn from_number(&self) -> Option<&str> {
        self.from_number.as_deref().filter(|s| !s.is_empty())
    }

    pub fn messaging_service_sid(&self) -> Option<&str> {
        self.messaging_service_sid.as_deref().filter(|s| !s.is_empty())
    }

    pub fn default_country_code(&self) -> &str {
        self.default_country_code.as_deref().unwrap_or("+91")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_SMS_TIMEOUT_SECONDS)
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or("https://api.twilio.com/2010-04-01")
    }
}
