//! Access-key/secret-key request signing primitives.
//!
//! A client proves it holds a shared secret by sending an HMAC over a small
//! set of request attributes (access key, nonce, timestamp, body hash). The
//! server resolves the secret for the access key, recomputes the HMAC, and
//! checks that the timestamp lies within an acceptable clock skew.
//!
//! # Usage
//!
//! ```rust
//! use aksk_core::{Auth, AuthOptions};
//!
//! let auth = Auth::new(AuthOptions::default());
//! let body_hash = auth.encode_to_string(&auth.sum(b"helloworld"));
//! let signature = auth.sign("secret", &["access-key", "nonce", "1700000000", body_hash.as_str()]);
//!
//! assert!(auth.valid_body(b"helloworld", &body_hash).is_ok());
//! let reordered = ["1700000000", "access-key", body_hash.as_str(), "nonce"];
//! assert!(auth.valid_signature("secret", &signature, &reordered).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`auth`] - The [`Auth`] facade combining encoding, hashing, and timestamp checks
//! - [`config`] - [`AuthOptions`] and environment loading
//! - [`credentials`] - [`KeyResolver`] trait and in-memory implementation
//! - [`encoding`] - Base64 and hex encoders
//! - [`error`] - Error types
//! - [`hash`] - Digest and HMAC over canonicalized elements
//! - [`timestamp`] - Timestamp freshness validation

pub mod auth;
pub mod config;
pub mod credentials;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod timestamp;

pub use auth::Auth;
pub use config::{AuthOptions, ConfigError};
pub use credentials::{KeyResolver, StaticKeyResolver};
pub use encoding::{Base64Encoder, Encoder, Encoding, HexEncoder};
pub use error::{AuthError, AuthResult, BoxError, DecodeError, KeyResolutionError};
pub use hash::HashAlgorithm;
pub use timestamp::{TimestampValidator, now_unix};
