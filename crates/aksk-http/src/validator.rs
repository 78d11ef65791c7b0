//! Server-side request validation.
//!
//! Validation runs in two phases:
//!
//! 1. [`RequestValidator::validate_headers`] checks the access key, timestamp,
//!    and signature using only the request headers. The body is not touched.
//! 2. [`RequestValidator::validate`] additionally buffers the body, checks it
//!    against `x-auth-body-hash`, and hands a fresh copy of the bytes onward.
//!
//! The signed element set on this side is always
//! `{access_key, timestamp, nonce, body_hash}`, with absent headers read as
//! empty strings. An empty element sorts first and adds nothing to the
//! concatenation, so this matches a signer that omits the body hash.

use std::fmt;
use std::sync::Arc;

use aksk_core::{Auth, AuthError, BoxError, KeyResolutionError, KeyResolver, now_unix};
use bytes::Bytes;
use http::HeaderMap;
use http_body::Body;
use http_body_util::BodyExt;
use tracing::debug;

use crate::body::AkskBody;
use crate::headers::{self, header_str};
use crate::replay::NonceCache;

/// Identity established for a request that passed validation.
///
/// Inserted into the request extensions by [`RequestValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The access key that signed the request.
    pub access_key: String,
    /// The request timestamp (Unix seconds).
    pub timestamp: String,
    /// The request nonce.
    pub nonce: String,
    /// The encoded body hash, empty if none was sent.
    pub body_hash: String,
}

/// Validates AKSK-signed requests.
#[derive(Clone)]
pub struct RequestValidator {
    auth: Auth,
    resolver: Arc<dyn KeyResolver>,
    skip_body: bool,
    replay_guard: Option<Arc<NonceCache>>,
}

impl fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("auth", &self.auth)
            .field("resolver", &"...")
            .field("skip_body", &self.skip_body)
            .field("replay_guard", &self.replay_guard.is_some())
            .finish()
    }
}

impl RequestValidator {
    /// Create a validator resolving secrets through `resolver`.
    pub fn new(auth: Auth, resolver: impl KeyResolver + 'static) -> Self {
        Self::from_shared(auth, Arc::new(resolver))
    }

    /// Create a validator from a shared resolver.
    #[must_use]
    pub fn from_shared(auth: Auth, resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            auth,
            resolver,
            skip_body: false,
            replay_guard: None,
        }
    }

    /// Do not read or check the request body.
    #[must_use]
    pub fn skip_body(mut self, skip: bool) -> Self {
        self.skip_body = skip;
        self
    }

    /// Reject requests whose (access key, nonce) pair was already accepted.
    #[must_use]
    pub fn with_replay_guard(mut self, guard: Arc<NonceCache>) -> Self {
        self.replay_guard = Some(guard);
        self
    }

    /// The verification context.
    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Whether body checks are skipped.
    #[must_use]
    pub fn skips_body(&self) -> bool {
        self.skip_body
    }

    /// Check the AKSK headers against the current time.
    pub fn validate_headers(&self, headers: &HeaderMap) -> Result<Authenticated, AuthError> {
        self.validate_headers_at(headers, now_unix())
    }

    /// Check the AKSK headers against `now` (Unix seconds).
    ///
    /// With a replay guard configured, the nonce is recorded once the
    /// signature verifies.
    pub fn validate_headers_at(
        &self,
        headers: &HeaderMap,
        now: i64,
    ) -> Result<Authenticated, AuthError> {
        let authenticated = self.verify_headers_at(headers, now)?;
        self.record_nonce(&authenticated, now)?;
        Ok(authenticated)
    }

    fn verify_headers_at(
        &self,
        headers: &HeaderMap,
        now: i64,
    ) -> Result<Authenticated, AuthError> {
        let access_key = header_str(headers, headers::ACCESS_KEY);
        if access_key.is_empty() {
            return Err(AuthError::AccessKeyEmpty);
        }

        let secret_key = self.resolve_secret(access_key)?;

        let timestamp = header_str(headers, headers::TIMESTAMP);
        self.auth.check_timestamp_at(timestamp, now)?;

        let signature = header_str(headers, headers::SIGNATURE);
        if signature.is_empty() {
            return Err(AuthError::SignatureEmpty);
        }

        let body_hash = header_str(headers, headers::BODY_HASH);
        let nonce = header_str(headers, headers::RANDOM_STR);

        self.auth.valid_signature(
            &secret_key,
            signature,
            &[access_key, timestamp, nonce, body_hash],
        )?;

        debug!(access_key, timestamp, "request signature verified");

        Ok(Authenticated {
            access_key: access_key.to_owned(),
            timestamp: timestamp.to_owned(),
            nonce: nonce.to_owned(),
            body_hash: body_hash.to_owned(),
        })
    }

    /// Validate a full request.
    ///
    /// Headers are checked first; if they fail, the body is dropped unread.
    /// Otherwise the body is buffered and checked (unless skipped), and the
    /// request is returned with an equivalent body and an [`Authenticated`]
    /// extension. The replay guard only records the nonce after the whole
    /// request has passed.
    pub async fn validate<B>(
        &self,
        request: http::Request<B>,
    ) -> Result<http::Request<AkskBody<B>>, AuthError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = request.into_parts();
        let now = now_unix();
        let authenticated = self.verify_headers_at(&parts.headers, now)?;

        let body = if self.skip_body {
            AkskBody::passthrough(body)
        } else {
            let bytes = body
                .collect()
                .await
                .map_err(|err| AuthError::BodyRead(err.into()))?
                .to_bytes();
            self.auth.valid_body(&bytes, &authenticated.body_hash)?;
            AkskBody::buffered(bytes)
        };

        self.record_nonce(&authenticated, now)?;
        parts.extensions.insert(authenticated);
        Ok(http::Request::from_parts(parts, body))
    }

    fn record_nonce(&self, authenticated: &Authenticated, now: i64) -> Result<(), AuthError> {
        if let Some(guard) = &self.replay_guard {
            if !guard.check_and_insert(&authenticated.access_key, &authenticated.nonce, now) {
                return Err(AuthError::NonceReplayed);
            }
        }
        Ok(())
    }

    fn resolve_secret(&self, access_key: &str) -> Result<String, AuthError> {
        let source = match self.resolver.resolve(access_key) {
            Ok(secret) if !secret.is_empty() => return Ok(secret),
            Ok(_) => KeyResolutionError::EmptySecret(access_key.to_owned()),
            Err(err) => err,
        };
        debug!(access_key, error = %source, "access key could not be resolved");
        Err(AuthError::AccessKeyInvalid {
            access_key: access_key.to_owned(),
            source,
        })
    }
}
