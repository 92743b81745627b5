use axum::{Json, Router, routing::get};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::services::ServeDir;

use crate::{app::AppState, auth::jwt_auth_layer, common::ApiError};

pub mod admin;
pub mod auth;
pub mod meta;
pub mod orders;
pub mod products;
pub mod shops;
pub mod upload;

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth::routes())
                .nest("/products", products::routes())
                .nest("/shops", shops::routes())
                .nest("/orders", orders::routes())
                .nest("/admin", admin::routes())
                .nest("/meta", meta::routes())
                .nest("/upload", upload::routes(state.uploads.max_file_size())),
        )
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .fallback(async || -> ApiError {
            tracing::info!("Not Found!");
            ApiError::NotFound("Not Found".to_string())
        })
        .method_not_allowed_fallback(async || -> ApiError {
            tracing::info!("Method Not Allowed!");
            ApiError::MethodNotAllowed
        })
        .layer(jwt_auth_layer(state.jwt.clone()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now().timestamp_millis() }))
}
