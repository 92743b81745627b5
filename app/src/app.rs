use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::normalize_path::NormalizePath;
use sea_orm::DatabaseConnection;

use crate::{
    api,
    auth::{JwtService, Passwords},
    config::{self, AppConfig},
    database, logger,
    server::Server,
    service::users,
    sms::SmsClient,
    upload::UploadStore,
};
use migration::{Migrator, MigratorTrait};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt: Arc<JwtService>,
    pub passwords: Passwords,
    pub sms: SmsClient,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        jwt: JwtService,
        passwords: Passwords,
        sms: SmsClient,
        uploads: UploadStore,
    ) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            passwords,
            sms,
            uploads,
        }
    }

    pub async fn from_config(db: DatabaseConnection, config: &AppConfig) -> anyhow::Result<Self> {
        let uploads = UploadStore::from_config(config.uploads(), config.s3()).await?;

        Ok(Self::new(
            db,
            JwtService::new(config.jwt().clone()),
            Passwords::new(config.auth().cost()),
            SmsClient::new(config.sms().clone())?,
            uploads,
        ))
    }
}

/// The API with its state attached, ready to serve or to drive from tests.
///
/// Trailing slashes are trimmed before the request reaches routing.
pub fn router(state: AppState) -> Router {
    let routes = api::create_router(&state).with_state(state);

    Router::new().fallback_service(NormalizePath::trim_trailing_slash(routes))
}

pub async fn run() -> anyhow::Result<()> {
    let config = config::get();

    logger::init(config.logger());

    tracing::info!("Starting application...");

    let db = database::init(config.database())
        .await
        .context("Failed to initialize database")?;

    Migrator::up(&db, None).await?;

    let state = AppState::from_config(db, config).await?;

    if let Err(err) = users::ensure_admin(&state.db, &state.passwords, config.auth()).await {
        tracing::error!(error = %err, "failed to ensure administrator account");
    }

    let server = Server::new(config.server());

    server.start(router(state)).await?;

    Ok(())
}
