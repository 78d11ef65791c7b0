//! Client-side request signing.
//!
//! The signer builds the signed element set for an outgoing request:
//!
//! ```text
//! elements  = { access_key, nonce, timestamp [, body_hash] }
//! signature = encode(HMAC(secret_key, sort(elements).join("")))
//! ```
//!
//! and attaches the result as `x-auth-*` headers. The body hash is only sent
//! for non-empty bodies (and never when body hashing is skipped).

use std::fmt;

use aksk_core::{Auth, AuthError, BoxError, KeyResolutionError, now_unix};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::body::AkskBody;
use crate::headers;

/// Number of random bytes in each nonce.
pub const NONCE_LEN: usize = 6;

/// The header values produced for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// The client's access key.
    pub access_key: String,
    /// Encoded random nonce.
    pub nonce: String,
    /// Unix seconds, decimal.
    pub timestamp: String,
    /// Encoded body digest, if the body was hashed and non-empty.
    pub body_hash: Option<String>,
    /// Encoded HMAC.
    pub signature: String,
}

impl SignatureHeaders {
    /// Write the headers into `headers`, replacing any previous values.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        headers.insert(headers::ACCESS_KEY, to_header_value(&self.access_key)?);
        headers.insert(headers::RANDOM_STR, to_header_value(&self.nonce)?);
        headers.insert(headers::TIMESTAMP, to_header_value(&self.timestamp)?);
        match &self.body_hash {
            Some(hash) => {
                headers.insert(headers::BODY_HASH, to_header_value(hash)?);
            }
            None => {
                headers.remove(headers::BODY_HASH);
            }
        }
        headers.insert(headers::SIGNATURE, to_header_value(&self.signature)?);
        Ok(())
    }
}

/// Signs outgoing requests with an access key and secret key.
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    auth: Auth,
    skip_body: bool,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("secret_key", &"...")
            .field("auth", &self.auth)
            .field("skip_body", &self.skip_body)
            .finish()
    }
}

impl RequestSigner {
    /// Create a signer for the given credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyEmpty`] if `access_key` is empty, or
    /// [`AuthError::AccessKeyInvalid`] if `secret_key` is empty.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        auth: Auth,
    ) -> Result<Self, AuthError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if access_key.is_empty() {
            return Err(AuthError::AccessKeyEmpty);
        }
        if secret_key.is_empty() {
            return Err(AuthError::AccessKeyInvalid {
                source: KeyResolutionError::EmptySecret(access_key.clone()),
                access_key,
            });
        }

        Ok(Self {
            access_key,
            secret_key,
            auth,
            skip_body: false,
        })
    }

    /// Do not hash the body. The server must be configured to skip body checks too.
    #[must_use]
    pub fn skip_body(mut self, skip: bool) -> Self {
        self.skip_body = skip;
        self
    }

    /// The access key this signer uses.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The signing context.
    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Compute the header bundle for `body` at time `now` (Unix seconds).
    pub fn signature_headers(&self, body: &[u8], now: i64) -> Result<SignatureHeaders, AuthError> {
        let nonce = self.nonce()?;
        Ok(self.signature_headers_with_nonce(body, now, nonce))
    }

    /// Compute the header bundle and write it into `headers`.
    pub fn sign_headers(
        &self,
        headers: &mut HeaderMap,
        body: &[u8],
    ) -> Result<SignatureHeaders, AuthError> {
        let bundle = self.signature_headers(body, now_unix())?;
        bundle.apply(headers)?;
        Ok(bundle)
    }

    /// Build a new signed request.
    pub fn sign<U>(
        &self,
        method: http::Method,
        uri: U,
        body: impl Into<Bytes>,
    ) -> Result<http::Request<Full<Bytes>>, AuthError>
    where
        http::Uri: TryFrom<U>,
        <http::Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        let body = body.into();
        let mut request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(body.clone()))
            .map_err(|err| AuthError::Request(err.into()))?;

        self.sign_headers(request.headers_mut(), &body)?;
        Ok(request)
    }

    /// Sign an existing request.
    ///
    /// Unless body hashing is skipped, the body is read fully into memory,
    /// hashed, and replaced by a buffered copy of the same bytes.
    pub async fn sign_request<B>(
        &self,
        request: http::Request<B>,
    ) -> Result<http::Request<AkskBody<B>>, AuthError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = request.into_parts();

        if self.skip_body {
            self.sign_headers(&mut parts.headers, &[])?;
            return Ok(http::Request::from_parts(parts, AkskBody::passthrough(body)));
        }

        let bytes = body
            .collect()
            .await
            .map_err(|err| AuthError::BodyRead(err.into()))?
            .to_bytes();
        self.sign_headers(&mut parts.headers, &bytes)?;
        Ok(http::Request::from_parts(parts, AkskBody::buffered(bytes)))
    }

    fn signature_headers_with_nonce(
        &self,
        body: &[u8],
        now: i64,
        nonce: String,
    ) -> SignatureHeaders {
        let timestamp = now.to_string();
        let body_hash = (!self.skip_body && !body.is_empty())
            .then(|| self.auth.encode_to_string(&self.auth.sum(body)));

        let mut elements = vec![self.access_key.as_str(), nonce.as_str(), timestamp.as_str()];
        if let Some(hash) = &body_hash {
            elements.push(hash.as_str());
        }
        let signature = self.auth.sign(&self.secret_key, &elements);

        debug!(
            access_key = %self.access_key,
            timestamp = %timestamp,
            body_hashed = body_hash.is_some(),
            "signed request"
        );

        SignatureHeaders {
            access_key: self.access_key.clone(),
            nonce,
            timestamp,
            body_hash,
            signature,
        }
    }

    fn nonce(&self) -> Result<String, AuthError> {
        let mut buf = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|err| AuthError::Io {
                context: "Failed to read random bytes",
                source: std::io::Error::other(err),
            })?;
        Ok(self.auth.encode_to_string(&buf))
    }
}

fn to_header_value(value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|err| AuthError::Request(err.into()))
}

#[cfg(test)]
mod tests {
    use aksk_core::{AuthOptions, Encoding, HashAlgorithm};

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn signer() -> RequestSigner {
        RequestSigner::new("123", "456", Auth::default()).unwrap()
    }

    #[test]
    fn test_should_reject_empty_access_key() {
        let result = RequestSigner::new("", "456", Auth::default());
        assert!(matches!(result, Err(AuthError::AccessKeyEmpty)));
    }

    #[test]
    fn test_should_reject_empty_secret_key() {
        let result = RequestSigner::new("123", "", Auth::default());
        assert!(matches!(result, Err(AuthError::AccessKeyInvalid { .. })));
    }

    #[test]
    fn test_should_hide_secret_in_debug_output() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains("123"));
        assert!(!debug.contains("456"));
    }

    #[test]
    fn test_should_sign_with_known_nonce() {
        let bundle =
            signer().signature_headers_with_nonce(b"helloworld", NOW, "bm9uY2U=".to_owned());
        let body_hash = "k2oYXKqiZrucvpgengXLeM1zKwsygOuURBK7b4+PB68=";
        assert_eq!(bundle.body_hash.as_deref(), Some(body_hash));
        assert_eq!(bundle.timestamp, "1700000000");

        let expected =
            Auth::default().sign("456", &["1700000000", "123", body_hash, "bm9uY2U="]);
        assert_eq!(bundle.signature, expected);
    }

    #[test]
    fn test_should_omit_body_hash_for_empty_body() {
        let bundle = signer().signature_headers(b"", NOW).unwrap();
        assert!(bundle.body_hash.is_none());
    }

    #[test]
    fn test_should_omit_body_hash_when_skipped() {
        let bundle = signer().skip_body(true).signature_headers(b"helloworld", NOW).unwrap();
        assert!(bundle.body_hash.is_none());
    }

    #[test]
    fn test_should_generate_distinct_nonces() {
        let first = signer().signature_headers(b"", NOW).unwrap();
        let second = signer().signature_headers(b"", NOW).unwrap();
        assert_ne!(first.nonce, second.nonce);
        // 6 bytes encode to 8 base64 characters.
        assert_eq!(first.nonce.len(), 8);
    }

    #[test]
    fn test_should_encode_nonce_with_configured_encoding() {
        let auth = Auth::new(
            AuthOptions::default()
                .with_encoding(Encoding::Hex)
                .with_hash(HashAlgorithm::Sha1),
        );
        let signer = RequestSigner::new("123", "456", auth).unwrap();
        let bundle = signer.signature_headers(b"x", NOW).unwrap();
        assert_eq!(bundle.nonce.len(), NONCE_LEN * 2);
        assert!(bundle.nonce.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(bundle.signature.len(), 40);
    }

    #[test]
    fn test_should_build_signed_request() {
        let request = signer()
            .sign(http::Method::POST, "http://localhost/echo", "helloworld")
            .unwrap();
        assert_eq!(request.method(), http::Method::POST);
        for name in headers::ALL {
            assert!(request.headers().contains_key(name), "missing {name}");
        }
        assert_eq!(
            request.headers().get(headers::ACCESS_KEY).unwrap(),
            "123"
        );
    }

    #[test]
    fn test_should_remove_stale_body_hash_header() {
        let mut headers = HeaderMap::new();
        headers.insert(headers::BODY_HASH, HeaderValue::from_static("stale"));
        signer().sign_headers(&mut headers, b"").unwrap();
        assert!(!headers.contains_key(headers::BODY_HASH));
    }

    #[test]
    fn test_should_surface_invalid_uri() {
        let result = signer().sign(http::Method::GET, "not a uri", Bytes::new());
        assert!(matches!(result, Err(AuthError::Request(_))));
    }

    #[tokio::test]
    async fn test_should_keep_body_readable_after_signing_existing_request() {
        let request = http::Request::builder()
            .method("PUT")
            .uri("/upload")
            .body(Full::new(Bytes::from_static(b"helloworld")))
            .unwrap();

        let signed = signer().sign_request(request).await.unwrap();
        assert!(signed.headers().contains_key(headers::BODY_HASH));
        assert!(signed.body().is_buffered());

        let body = signed.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"helloworld");
    }

    #[tokio::test]
    async fn test_should_pass_body_through_when_skipped() {
        let request = http::Request::builder()
            .uri("/upload")
            .body(Full::new(Bytes::from_static(b"helloworld")))
            .unwrap();

        let signed = signer().skip_body(true).sign_request(request).await.unwrap();
        assert!(!signed.headers().contains_key(headers::BODY_HASH));
        assert!(!signed.body().is_buffered());
    }
}
