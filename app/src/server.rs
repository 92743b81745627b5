use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::{common::latency::LatencyResponse, config::ServerConfig};

pub struct Server {
    config: &'static ServerConfig,
}

impl Server {
    pub fn new(config: &'static ServerConfig) -> Self {
        Self { config }
    }

    pub async fn start(&self, router: Router) -> anyhow::Result<()> {
        let router = self.build_router(router)?;
        let port = self.config.port();

        let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }

    fn build_router(&self, router: Router) -> anyhow::Result<Router> {
        let tracing_layer = tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(|request: &Request| {
                let method = request.method();
                let uri = request.uri();
                let id = xid::new();

                tracing::info_span!("Http Request", id = %id, method = %method, uri = %uri)
            })
            .on_request(())
            .on_failure(())
            .on_response(LatencyResponse);

        let timeout_layer = {
            let timeout = Duration::from_secs(self.config.timeout_seconds());
            TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
        };

        let body_limit_layer =
            tower_http::limit::RequestBodyLimitLayer::new(self.config.max_body_size_bytes());

        Ok(router
            .layer(timeout_layer)
            .layer(body_limit_layer)
            .layer(tracing_layer)
            .layer(self.cors_layer()?))
    }

    /// A configured browser origin may send credentials; otherwise any origin is allowed without them.
    fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        let max_age = Duration::from_secs(86400); // 1 day

        let Some(origin) = self.config.cors_origin() else {
            return Ok(CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_credentials(false)
                .max_age(max_age));
        };

        let origin = origin
            .parse::<HeaderValue>()
            .with_context(|| format!("invalid cors origin: {origin}"))?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(max_age))
    }
}
