use std::sync::Arc;
use std::{future::Future, pin::Pin};

use axum::body::Body;
use axum::http::{Request, Response, header::AUTHORIZATION};
use tower_http::auth::{AsyncAuthorizeRequest, AsyncRequireAuthorizationLayer};

use super::{identity::Authentication, service::JwtService};

/// Decodes the bearer credential, if any, into an [`Authentication`].
///
/// It never rejects a request itself: open routes stay reachable with a stale token,
/// and handlers that need an identity reject through the `Identity` extractor.
#[derive(Clone)]
pub struct JwtAuthLayer {
    jwt: Arc<JwtService>,
}

impl JwtAuthLayer {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        JwtAuthLayer { jwt }
    }

    fn authenticate(&self, request: &Request<Body>) -> Authentication {
        let Some(header) = request.headers().get(AUTHORIZATION) else {
            return Authentication::Anonymous;
        };

        let Some(token) = header.to_str().ok().and_then(extract_bearer) else {
            return Authentication::Rejected("Malformed Authorization header".to_string());
        };

        match self.jwt.decode(token) {
            Ok(identity) => Authentication::Authenticated(identity),
            Err(err) => {
                tracing::debug!(error = %err, "bearer token rejected");
                Authentication::Rejected("Token is not valid".to_string())
            }
        }
    }
}

pub fn jwt_auth_layer(jwt: Arc<JwtService>) -> AsyncRequireAuthorizationLayer<JwtAuthLayer> {
    AsyncRequireAuthorizationLayer::new(JwtAuthLayer::new(jwt))
}

impl AsyncAuthorizeRequest<Body> for JwtAuthLayer {
    type RequestBody = Body;

    type ResponseBody = Body;

    type Future = Pin<
        Box<
            dyn Future<Output = Result<Request<Self::RequestBody>, Response<Self::ResponseBody>>>
                + Send,
        >,
    >;

    fn authorize(&mut self, mut request: Request<Body>) -> Self::Future {
        let authentication = self.authenticate(&request);
        request.extensions_mut().insert(authentication);

        Box::pin(async move { Ok(request) })
    }
}

fn extract_bearer(raw: &str) -> Option<&str> {
    let (scheme, token) = raw.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
