pub mod auth;
pub mod database;
pub mod jwt;
pub mod logger;
pub mod s3;
pub mod server;
pub mod sms;
pub mod uploads;

pub(crate) use std::sync::LazyLock;

use anyhow::Context;
use config::Config;
use serde::Deserialize;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use logger::LoggerConfig;
pub use s3::S3Config;
pub use server::ServerConfig;
pub use sms::SmsConfig;
pub use uploads::UploadsConfig;

static APPCONFIG: LazyLock<AppConfig> =
    LazyLock::new(|| AppConfig::load().expect("Failed to load application configuration"));

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    server: ServerConfig,
    database: DatabaseConfig,
    #[serde(default)]
    jwt: JwtConfig,
    #[serde(default)]
    auth: AuthConfig,
    #[serde(default)]
    s3: S3Config,
    #[serde(default)]
    sms: SmsConfig,
    #[serde(default)]
    uploads: UploadsConfig,
    #[serde(default)]
    logger: LoggerConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Config::builder()
            .add_source(
                config::File::with_name("application")
                    .format(config::FileFormat::Yaml)
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .try_parsing(true)
                    .separator("_"),
            )
            .build()
            .with_context(|| "Failed to read The Configuration")?
            .try_deserialize()
            .with_context(|| "Failed to deserialize The Configuration")
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn s3(&self) -> &S3Config {
        &self.s3
    }

    pub fn sms(&self) -> &SmsConfig {
        &self.sms
    }

    pub fn uploads(&self) -> &UploadsConfig {
        &self.uploads
    }

    pub fn logger(&self) -> &LoggerConfig {
        &self.logger
    }
}

pub fn get() -> &'static AppConfig {
    &APPCONFIG
}
