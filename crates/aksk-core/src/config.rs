//! Configuration for an [`Auth`](crate::Auth) context.
//!
//! Options can be built in code or loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AKSK_ENCODING` | `base64` | `base64` or `hex` |
//! | `AKSK_HASH` | `sha256` | `sha1`, `sha256`, or `sha512` |
//! | `AKSK_ACCEPTABLE_SKEW_SECS` | `60` | Allowed clock skew in seconds |

use std::time::Duration;

use crate::encoding::Encoding;
use crate::hash::HashAlgorithm;

/// Default acceptable clock skew.
pub const DEFAULT_ACCEPTABLE_SKEW: Duration = Duration::from_secs(60);

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Options for constructing an [`Auth`](crate::Auth) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOptions {
    /// Encoding used for signatures, body hashes, and nonces.
    pub encoding: Encoding,
    /// Hash algorithm used for body digests and the HMAC.
    pub hash: HashAlgorithm,
    /// Maximum allowed difference between request time and server time.
    pub acceptable_skew: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            hash: HashAlgorithm::default(),
            acceptable_skew: DEFAULT_ACCEPTABLE_SKEW,
        }
    }
}

impl AuthOptions {
    /// Use the given encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Use the given hash algorithm.
    #[must_use]
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Accept timestamps within `skew` of the server clock.
    #[must_use]
    pub fn with_acceptable_skew(mut self, skew: Duration) -> Self {
        self.acceptable_skew = skew;
        self
    }

    /// Load options from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load options through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        if let Some(v) = lookup("AKSK_ENCODING") {
            options.encoding = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "AKSK_ENCODING",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("AKSK_HASH") {
            options.hash = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "AKSK_HASH",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("AKSK_ACCEPTABLE_SKEW_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "AKSK_ACCEPTABLE_SKEW_SECS",
                value: v.clone(),
            })?;
            options.acceptable_skew = Duration::from_secs(secs);
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_options() {
        let options = AuthOptions::default();
        assert_eq!(options.encoding, Encoding::Base64);
        assert_eq!(options.hash, HashAlgorithm::Sha256);
        assert_eq!(options.acceptable_skew, Duration::from_secs(60));
    }

    #[test]
    fn test_should_load_options_from_lookup() {
        let options = AuthOptions::from_lookup(lookup_from(&[
            ("AKSK_ENCODING", "hex"),
            ("AKSK_HASH", "sha1"),
            ("AKSK_ACCEPTABLE_SKEW_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(options.encoding, Encoding::Hex);
        assert_eq!(options.hash, HashAlgorithm::Sha1);
        assert_eq!(options.acceptable_skew, Duration::from_secs(30));
    }

    #[test]
    fn test_should_keep_defaults_for_missing_variables() {
        let options = AuthOptions::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(options, AuthOptions::default());
    }

    #[test]
    fn test_should_reject_invalid_values() {
        let result = AuthOptions::from_lookup(lookup_from(&[("AKSK_HASH", "md5")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "AKSK_HASH", .. })
        ));

        let result = AuthOptions::from_lookup(lookup_from(&[("AKSK_ACCEPTABLE_SKEW_SECS", "-5")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_should_chain_builder_setters() {
        let options = AuthOptions::default()
            .with_encoding(Encoding::Hex)
            .with_hash(HashAlgorithm::Sha512)
            .with_acceptable_skew(Duration::from_secs(5));
        assert_eq!(options.encoding, Encoding::Hex);
        assert_eq!(options.hash, HashAlgorithm::Sha512);
        assert_eq!(options.acceptable_skew, Duration::from_secs(5));
    }
}
