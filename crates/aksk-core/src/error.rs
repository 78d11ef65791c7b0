//! Error types for AKSK signing and verification.
//!
//! Every failure mode of the signing pipeline is a variant of [`AuthError`].
//! Error text never contains secret keys, MACs, or body digests; the access
//! key and the raw timestamp are identifiers and may appear.

use std::num::ParseIntError;

/// Boxed error used for failures coming from collaborators (body streams,
/// request builders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while decoding an encoded MAC or digest.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The input is not valid padded standard base64.
    #[error("invalid base64 input")]
    Base64(#[from] base64::DecodeError),

    /// The input is not valid hexadecimal.
    #[error("invalid hex input")]
    Hex(#[from] hex::FromHexError),
}

/// Errors returned by a [`KeyResolver`](crate::KeyResolver).
#[derive(Debug, thiserror::Error)]
pub enum KeyResolutionError {
    /// No secret is registered for the access key.
    #[error("Access key not found: {0}")]
    NotFound(String),

    /// The resolver returned an empty secret.
    #[error("Secret key for access key {0} is empty")]
    EmptySecret(String),

    /// The backing store failed.
    #[error("Key lookup failed: {context}")]
    Backend {
        /// What the resolver was doing when it failed.
        context: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl KeyResolutionError {
    /// Wrap a backend failure with a context message.
    pub fn backend(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Errors that can occur while signing or verifying an AKSK request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `x-auth-access-key` header is missing or empty, or the signer was
    /// built without an access key.
    #[error("Access key is empty")]
    AccessKeyEmpty,

    /// The access key could not be resolved to a non-empty secret.
    #[error("Access key is invalid: {access_key}")]
    AccessKeyInvalid {
        /// The access key presented by the client.
        access_key: String,
        /// Why resolution failed.
        #[source]
        source: KeyResolutionError,
    },

    /// The `x-auth-timestamp` header is missing or empty.
    #[error("Timestamp is empty")]
    TimestampEmpty,

    /// The timestamp is not a base-10 integer, or lies too far in the future.
    #[error("Timestamp {timestamp} is invalid")]
    TimestampInvalid {
        /// The raw header value.
        timestamp: String,
        /// Parse failure, if the value was not an integer.
        #[source]
        source: Option<ParseIntError>,
    },

    /// The timestamp is older than the acceptable skew.
    #[error("Timestamp {0} has expired")]
    TimestampExpired(String),

    /// The `x-auth-signature` header is missing or empty.
    #[error("Signature is empty")]
    SignatureEmpty,

    /// The signature is malformed or does not match.
    #[error("Signature is invalid")]
    SignatureInvalid,

    /// The request has a body but no `x-auth-body-hash` header.
    #[error("Body hash is missing")]
    BodyHashMissing,

    /// The body hash is malformed or does not match the body.
    #[error("Body is invalid")]
    BodyInvalid,

    /// An encoded value could not be decoded.
    #[error("Decoding failed")]
    Decoding(#[from] DecodeError),

    /// The nonce was already used within the replay window.
    #[error("Nonce has already been used")]
    NonceReplayed,

    /// The request body could not be read.
    #[error("Failed to read request body")]
    BodyRead(#[source] BoxError),

    /// An I/O failure, such as the random source being unavailable.
    #[error("{context}")]
    Io {
        /// What was being attempted.
        context: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The outgoing request could not be constructed.
    #[error("Failed to build request")]
    Request(#[source] BoxError),
}

/// Convenience result type for AKSK operations.
pub type AuthResult<T> = Result<T, AuthError>;
