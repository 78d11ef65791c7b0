//! Request routing for the echo server.
//!
//! `GET /_health` is answered directly. Every other request goes through
//! [`AkskService`] to the [`EchoService`], which returns the request body.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use aksk_http::{AkskBody, AkskService, Authenticated};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use tracing::{info, warn};

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Infallible>> + Send>>;

/// Echoes the authenticated request body back to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoService;

impl<B> Service<http::Request<AkskBody<B>>> for EchoService
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::fmt::Display,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response>;

    fn call(&self, req: http::Request<AkskBody<B>>) -> Self::Future {
        Box::pin(async move {
            let access_key = req
                .extensions()
                .get::<Authenticated>()
                .map(|identity| identity.access_key.clone())
                .unwrap_or_default();

            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    warn!(error = %err, "failed to read request body");
                    return Ok(plain(http::StatusCode::BAD_REQUEST, "failed to read body"));
                }
            };

            info!(access_key = %access_key, len = body.len(), "echoing request");
            Ok(http::Response::new(Full::new(body)))
        })
    }
}

/// Top-level service: health check bypass in front of the protected echo.
#[derive(Debug, Clone)]
pub struct GatewayService {
    protected: AkskService<EchoService>,
}

impl GatewayService {
    /// Create the gateway from an authentication middleware.
    #[must_use]
    pub fn new(protected: AkskService<EchoService>) -> Self {
        Self { protected }
    }
}

impl<B> Service<http::Request<B>> for GatewayService
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<aksk_core::BoxError> + std::fmt::Display,
{
    type Response = http::Response<AkskBody<Full<Bytes>>>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        if is_health_check(req.method(), req.uri().path()) {
            return Box::pin(async { Ok(health_check_response().map(AkskBody::from_full)) });
        }
        self.protected.call(req)
    }
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/_health"
}

fn health_check_response() -> http::Response<Full<Bytes>> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(br#"{"status":"running"}"#)))
        .expect("static health response should be valid")
}

fn plain(status: http::StatusCode, message: &'static str) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use aksk_core::{Auth, StaticKeyResolver};
    use aksk_http::{RequestSigner, RequestValidator};

    use super::*;

    fn gateway() -> GatewayService {
        let validator = RequestValidator::new(
            Auth::default(),
            StaticKeyResolver::new(vec![("123".to_owned(), "456".to_owned())]),
        );
        GatewayService::new(AkskService::new(EchoService, validator))
    }

    async fn read_body(response: http::Response<AkskBody<Full<Bytes>>>) -> Bytes {
        match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn test_should_answer_health_check_without_auth() {
        let req = http::Request::builder()
            .uri("/_health")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = gateway().call(req).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(&read_body(response).await[..], br#"{"status":"running"}"#);
    }

    #[tokio::test]
    async fn test_should_echo_signed_request() {
        let req = RequestSigner::new("123", "456", Auth::default())
            .unwrap()
            .sign(http::Method::POST, "/echo", "helloworld")
            .unwrap();
        let response = gateway().call(req).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(&read_body(response).await[..], b"helloworld");
    }

    #[tokio::test]
    async fn test_should_reject_unsigned_request() {
        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri("/echo")
            .body(Full::new(Bytes::from_static(b"helloworld")))
            .unwrap();
        let response = gateway().call(req).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_should_only_bypass_get_health() {
        assert!(is_health_check(&http::Method::GET, "/_health"));
        assert!(!is_health_check(&http::Method::POST, "/_health"));
        assert!(!is_health_check(&http::Method::GET, "/health"));
    }
}
