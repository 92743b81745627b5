use serde::Deserialize;

/// Object storage for uploaded part images. Local disk is used when disabled.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    pub enabled: Option<bool>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub prefix: Option<String>,
    /// Public base the stored keys are reachable under, e.g. a CDN host.
    pub public_base_url: Option<String>,
}

impl S3Config {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|b| !b.is_empty())
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }

    pub fn access_key_id(&self) -> Option<&str> {
        self.access_key_id.as_deref()
    }

    pub fn secret_access_key(&self) -> Option<&str> {
        self.secret_access_key.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("").trim_matches('/')
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref().filter(|u| !u.is_empty())
    }
}
