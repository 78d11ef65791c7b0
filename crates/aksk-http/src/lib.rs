//! HTTP integration for AKSK request authentication.
//!
//! This crate applies the primitives from [`aksk_core`] to `http` requests:
//!
//! - [`RequestSigner`] adds the `x-auth-*` headers to outgoing requests.
//! - [`RequestValidator`] checks those headers and the body hash on incoming
//!   requests.
//! - [`AkskService`] wraps a hyper service and rejects requests that fail
//!   validation.
//! - [`NonceCache`] is an opt-in replay guard for the validator.
//!
//! # Example
//!
//! ```rust
//! use aksk_core::{Auth, StaticKeyResolver};
//! use aksk_http::{RequestSigner, RequestValidator};
//!
//! let signer = RequestSigner::new("123", "456", Auth::default()).unwrap();
//! let request = signer
//!     .sign(http::Method::POST, "http://localhost/echo", "helloworld")
//!     .unwrap();
//!
//! let validator = RequestValidator::new(
//!     Auth::default(),
//!     StaticKeyResolver::new(vec![("123".to_owned(), "456".to_owned())]),
//! );
//! let identity = validator.validate_headers(request.headers()).unwrap();
//! assert_eq!(identity.access_key, "123");
//! ```

pub mod body;
pub mod headers;
pub mod replay;
pub mod response;
pub mod service;
pub mod signer;
pub mod validator;

pub use body::AkskBody;
pub use replay::NonceCache;
pub use response::{ErrorResponder, JsonErrorResponder};
pub use service::AkskService;
pub use signer::{RequestSigner, SignatureHeaders};
pub use validator::{Authenticated, RequestValidator};
