//! The [`Auth`] facade: signing and verification with one fixed configuration.
//!
//! An `Auth` bundles an [`Encoding`], a [`HashAlgorithm`], and a
//! [`TimestampValidator`]. It is immutable and cheap to copy, so a single value
//! can be shared by every request handler.

use std::time::Duration;

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::AuthOptions;
use crate::encoding::{Encoder, Encoding};
use crate::error::AuthError;
use crate::hash::HashAlgorithm;
use crate::timestamp::TimestampValidator;

/// Signing and verification context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Auth {
    encoding: Encoding,
    hash: HashAlgorithm,
    timestamps: TimestampValidator,
}

impl Default for Auth {
    fn default() -> Self {
        Self::new(AuthOptions::default())
    }
}

impl From<AuthOptions> for Auth {
    fn from(options: AuthOptions) -> Self {
        Self::new(options)
    }
}

impl Auth {
    /// Create a context from the given options.
    #[must_use]
    pub fn new(options: AuthOptions) -> Self {
        Self {
            encoding: options.encoding,
            hash: options.hash,
            timestamps: TimestampValidator::new(options.acceptable_skew),
        }
    }

    /// The configured encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The configured hash algorithm.
    #[must_use]
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// The configured clock-skew window.
    #[must_use]
    pub fn acceptable_skew(&self) -> Duration {
        self.timestamps.acceptable_skew()
    }

    /// Digest `data` with the configured hash algorithm.
    #[must_use]
    pub fn sum(&self, data: &[u8]) -> Vec<u8> {
        self.hash.digest(data)
    }

    /// Encode bytes with the configured encoding.
    #[must_use]
    pub fn encode_to_string(&self, bytes: &[u8]) -> String {
        self.encoding.encode(bytes)
    }

    /// Decode a string with the configured encoding.
    pub fn decode_string(&self, input: &str) -> Result<Vec<u8>, AuthError> {
        Ok(self.encoding.decode(input)?)
    }

    /// HMAC over the sorted concatenation of `elements`.
    #[must_use]
    pub fn hmac<S: AsRef<str>>(&self, secret: &[u8], elements: &[S]) -> Vec<u8> {
        self.hash.hmac(secret, elements)
    }

    /// Compute the encoded signature for `elements`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aksk_core::Auth;
    ///
    /// let auth = Auth::default();
    /// assert_eq!(
    ///     auth.sign("123", &["helloworld", "123456"]),
    ///     "TwcsQLXoVS8PeAJYptZqZuCVHfIkMWwuWF4k0EvKRVA="
    /// );
    /// ```
    #[must_use]
    pub fn sign<S: AsRef<str>>(&self, secret: &str, elements: &[S]) -> String {
        self.encode_to_string(&self.hmac(secret.as_bytes(), elements))
    }

    /// Check a timestamp against the current time.
    pub fn check_timestamp(&self, timestamp: &str) -> Result<(), AuthError> {
        self.timestamps.check(timestamp)
    }

    /// Check a timestamp against `now` (Unix seconds).
    pub fn check_timestamp_at(&self, timestamp: &str, now: i64) -> Result<(), AuthError> {
        self.timestamps.check_at(timestamp, now)
    }

    /// Verify the body against its encoded digest.
    ///
    /// An empty body always passes, whatever `encoded_hash` holds.
    pub fn valid_body(&self, body: &[u8], encoded_hash: &str) -> Result<(), AuthError> {
        if body.is_empty() {
            return Ok(());
        }
        if encoded_hash.is_empty() {
            return Err(AuthError::BodyHashMissing);
        }

        let provided = self.encoding.decode(encoded_hash).map_err(|err| {
            debug!(error = %err, "body hash could not be decoded");
            AuthError::BodyInvalid
        })?;
        let expected = self.sum(body);

        if provided.ct_eq(&expected).into() {
            Ok(())
        } else {
            debug!(body_len = body.len(), "body hash mismatch");
            Err(AuthError::BodyInvalid)
        }
    }

    /// Verify an encoded signature over `elements` keyed by `secret`.
    pub fn valid_signature<S: AsRef<str>>(
        &self,
        secret: &str,
        encoded_signature: &str,
        elements: &[S],
    ) -> Result<(), AuthError> {
        let provided = self.encoding.decode(encoded_signature).map_err(|err| {
            debug!(error = %err, "signature could not be decoded");
            AuthError::SignatureInvalid
        })?;
        let expected = self.hmac(secret.as_bytes(), elements);

        // Constant-time comparison to prevent timing attacks.
        if provided.ct_eq(&expected).into() {
            Ok(())
        } else {
            debug!("signature mismatch");
            Err(AuthError::SignatureInvalid)
        }
    }
}
