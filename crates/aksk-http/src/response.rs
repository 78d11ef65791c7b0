//! Rejection responses.
//!
//! When validation fails the middleware asks an [`ErrorResponder`] to build
//! the reply. [`JsonErrorResponder`] is the default and produces
//! `401 Unauthorized` with a body of `{"message": "<error text>"}`.

use aksk_core::AuthError;
use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;

/// Builds the response sent for a rejected request.
pub trait ErrorResponder: Send + Sync {
    /// Render `err` as an HTTP response.
    fn respond(&self, err: &AuthError) -> http::Response<Full<Bytes>>;
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

/// Default responder: `401` with a JSON message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorResponder;

impl ErrorResponder for JsonErrorResponder {
    fn respond(&self, err: &AuthError) -> http::Response<Full<Bytes>> {
        let message = err.to_string();
        let body = serde_json::to_vec(&ErrorBody { message: &message })
            .unwrap_or_else(|_| br#"{"message":"unauthorized"}"#.to_vec());

        http::Response::builder()
            .status(http::StatusCode::UNAUTHORIZED)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .expect("static error response should be valid")
    }
}
