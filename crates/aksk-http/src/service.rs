//! hyper middleware enforcing AKSK authentication.
//!
//! [`AkskService`] validates each request with a [`RequestValidator`]. Rejected
//! requests are answered by the configured [`ErrorResponder`] and never reach
//! the inner service. Accepted requests are forwarded with the body wrapped in
//! [`AkskBody`] and an [`Authenticated`](crate::Authenticated) extension.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use aksk_core::BoxError;
use bytes::Bytes;
use http_body::Body;
use hyper::service::Service;
use tracing::{debug, warn};

use crate::body::AkskBody;
use crate::response::{ErrorResponder, JsonErrorResponder};
use crate::validator::RequestValidator;

/// AKSK authentication middleware around an inner hyper service.
pub struct AkskService<S> {
    inner: S,
    validator: Arc<RequestValidator>,
    responder: Arc<dyn ErrorResponder>,
}

impl<S: fmt::Debug> fmt::Debug for AkskService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AkskService")
            .field("inner", &self.inner)
            .field("validator", &self.validator)
            .field("responder", &"...")
            .finish()
    }
}

impl<S: Clone> Clone for AkskService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            validator: Arc::clone(&self.validator),
            responder: Arc::clone(&self.responder),
        }
    }
}

impl<S> AkskService<S> {
    /// Wrap `inner`, rejecting unauthenticated requests with a JSON 401.
    #[must_use]
    pub fn new(inner: S, validator: RequestValidator) -> Self {
        Self::from_shared(inner, Arc::new(validator))
    }

    /// Wrap `inner` with a shared validator.
    #[must_use]
    pub fn from_shared(inner: S, validator: Arc<RequestValidator>) -> Self {
        Self {
            inner,
            validator,
            responder: Arc::new(JsonErrorResponder),
        }
    }

    /// Replace the rejection responder.
    #[must_use]
    pub fn with_responder(mut self, responder: impl ErrorResponder + 'static) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// The validator applied to every request.
    #[must_use]
    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }
}

impl<S, B, ResB> Service<http::Request<B>> for AkskService<S>
where
    S: Service<http::Request<AkskBody<B>>, Response = http::Response<ResB>>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<AkskBody<ResB>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let validator = Arc::clone(&self.validator);
        let responder = Arc::clone(&self.responder);

        Box::pin(async move {
            let method = req.method().clone();
            let uri = req.uri().clone();

            match validator.validate(req).await {
                Ok(req) => {
                    debug!(%method, %uri, "request authenticated");
                    let response = inner.call(req).await?;
                    Ok(response.map(AkskBody::passthrough))
                }
                Err(err) => {
                    warn!(%method, %uri, error = %err, "request rejected");
                    Ok(responder.respond(&err).map(AkskBody::from_full))
                }
            }
        })
    }
}
