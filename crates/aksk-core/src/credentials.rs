//! Secret lookup by access key.
//!
//! This module defines the [`KeyResolver`] trait used by the server side to
//! turn an access key into its secret, along with a [`StaticKeyResolver`] for
//! tests and small deployments. Any `Fn(&str) -> Result<String, KeyResolutionError>`
//! closure is also a resolver.

use std::collections::HashMap;
use std::fmt;

use crate::error::KeyResolutionError;

/// Looks up the secret key for an access key.
///
/// Implementations may block (for example on a network-backed secret store).
/// Errors are surfaced to the caller as-is; no retry is attempted.
pub trait KeyResolver: Send + Sync {
    /// Retrieve the secret key for `access_key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyResolutionError::NotFound`] if the access key is unknown, or
    /// [`KeyResolutionError::Backend`] if the store could not be queried.
    fn resolve(&self, access_key: &str) -> Result<String, KeyResolutionError>;
}

impl<F> KeyResolver for F
where
    F: Fn(&str) -> Result<String, KeyResolutionError> + Send + Sync,
{
    fn resolve(&self, access_key: &str) -> Result<String, KeyResolutionError> {
        self(access_key)
    }
}

/// An in-memory resolver backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use aksk_core::{KeyResolver, StaticKeyResolver};
///
/// let resolver = StaticKeyResolver::new(vec![("123".to_owned(), "456".to_owned())]);
/// assert_eq!(resolver.resolve("123").unwrap(), "456");
/// assert!(resolver.resolve("unknown").is_err());
/// ```
#[derive(Clone, Default)]
pub struct StaticKeyResolver {
    credentials: HashMap<String, String>,
}

impl StaticKeyResolver {
    /// Create a resolver from (access_key, secret_key) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// Parse a list of `access_key:secret_key` pairs separated by commas.
    ///
    /// Blank entries are skipped. Entries without a `:` are rejected.
    ///
    /// # Errors
    ///
    /// Returns the offending entry if it has no `:` separator or an empty part.
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut credentials = HashMap::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (ak, sk) = entry.split_once(':').ok_or_else(|| entry.to_owned())?;
            if ak.is_empty() || sk.is_empty() {
                return Err(entry.to_owned());
            }
            credentials.insert(ak.to_owned(), sk.to_owned());
        }
        Ok(Self { credentials })
    }

    /// Number of registered access keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no access keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("StaticKeyResolver")
            .field("access_keys", &keys)
            .finish_non_exhaustive()
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, access_key: &str) -> Result<String, KeyResolutionError> {
        self.credentials
            .get(access_key)
            .cloned()
            .ok_or_else(|| KeyResolutionError::NotFound(access_key.to_owned()))
    }
}
