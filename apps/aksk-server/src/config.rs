//! Server configuration loaded from environment variables.

use std::fmt;

use aksk_core::{AuthOptions, StaticKeyResolver};
use anyhow::{Context, Result, anyhow};

/// Runtime configuration for the echo server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub gateway_listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Raw `ak:sk[,ak:sk...]` list.
    pub credentials: String,
    /// Skip body hash verification.
    pub skip_body: bool,
    /// Reject repeated nonces within the skew window.
    pub replay_guard: bool,
    /// Signing options shared with clients.
    pub auth: AuthOptions,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("gateway_listen", &self.gateway_listen)
            .field("log_level", &self.log_level)
            .field("credentials", &"...")
            .field("skip_body", &self.skip_body)
            .field("replay_guard", &self.replay_guard)
            .field("auth", &self.auth)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let auth = AuthOptions::from_lookup(&lookup).context("invalid signing options")?;

        Ok(Self {
            gateway_listen: lookup("GATEWAY_LISTEN").unwrap_or_else(|| "0.0.0.0:8080".to_owned()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            credentials: lookup("AKSK_CREDENTIALS").unwrap_or_default(),
            skip_body: lookup("AKSK_SKIP_BODY").is_some_and(|v| parse_flag(&v)),
            replay_guard: lookup("AKSK_REPLAY_GUARD").is_some_and(|v| parse_flag(&v)),
            auth,
        })
    }

    /// Build the key resolver from the configured credentials.
    pub fn resolver(&self) -> Result<StaticKeyResolver> {
        StaticKeyResolver::parse(&self.credentials)
            .map_err(|entry| anyhow!("invalid AKSK_CREDENTIALS entry: {entry:?}"))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_should_use_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.gateway_listen, "0.0.0.0:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.skip_body);
        assert!(!config.replay_guard);
        assert!(config.resolver().unwrap().is_empty());
    }

    #[test]
    fn test_should_read_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("GATEWAY_LISTEN", "127.0.0.1:9000"),
            ("AKSK_CREDENTIALS", "123:456, abc:def"),
            ("AKSK_SKIP_BODY", "true"),
            ("AKSK_REPLAY_GUARD", "1"),
            ("AKSK_ACCEPTABLE_SKEW_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.gateway_listen, "127.0.0.1:9000");
        assert!(config.skip_body);
        assert!(config.replay_guard);
        assert_eq!(config.auth.acceptable_skew, Duration::from_secs(30));
        assert_eq!(config.resolver().unwrap().len(), 2);
    }

    #[test]
    fn test_should_reject_malformed_credentials() {
        let lookup = lookup_from(&[("AKSK_CREDENTIALS", "no-separator")]);
        let config = ServerConfig::from_lookup(lookup).unwrap();
        assert!(config.resolver().is_err());
    }

    #[test]
    fn test_should_reject_invalid_signing_options() {
        let result = ServerConfig::from_lookup(lookup_from(&[("AKSK_ENCODING", "base32")]));
        assert!(result.is_err());
    }
}
