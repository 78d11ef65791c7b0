//! Timestamp freshness checks.
//!
//! A request timestamp is a decimal count of Unix seconds. It is accepted
//! when `-skew <= now - timestamp <= skew`; older values are expired and
//! values further in the future are invalid.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::error::AuthError;

/// Current time as Unix seconds.
#[must_use]
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Validates request timestamps against an acceptable clock skew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampValidator {
    acceptable_skew: Duration,
}

impl TimestampValidator {
    /// Create a validator accepting timestamps within `acceptable_skew` of now.
    #[must_use]
    pub fn new(acceptable_skew: Duration) -> Self {
        Self { acceptable_skew }
    }

    /// The configured skew window.
    #[must_use]
    pub fn acceptable_skew(&self) -> Duration {
        self.acceptable_skew
    }

    /// Check `timestamp` against the current time.
    pub fn check(&self, timestamp: &str) -> Result<(), AuthError> {
        self.check_at(timestamp, now_unix())
    }

    /// Check `timestamp` against `now` (Unix seconds).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use aksk_core::TimestampValidator;
    ///
    /// let validator = TimestampValidator::new(Duration::from_secs(30));
    /// assert!(validator.check_at("1000", 1030).is_ok());
    /// assert!(validator.check_at("1000", 1031).is_err());
    /// ```
    pub fn check_at(&self, timestamp: &str, now: i64) -> Result<(), AuthError> {
        if timestamp.is_empty() {
            return Err(AuthError::TimestampEmpty);
        }

        let parsed: i64 = timestamp
            .parse()
            .map_err(|err| AuthError::TimestampInvalid {
                timestamp: timestamp.to_owned(),
                source: Some(err),
            })?;

        let window = i64::try_from(self.acceptable_skew.as_secs()).unwrap_or(i64::MAX);
        let delta = now.saturating_sub(parsed);

        if delta > window {
            debug!(timestamp, delta, window, "timestamp expired");
            return Err(AuthError::TimestampExpired(timestamp.to_owned()));
        }
        if delta < window.saturating_neg() {
            debug!(timestamp, delta, window, "timestamp too far in the future");
            return Err(AuthError::TimestampInvalid {
                timestamp: timestamp.to_owned(),
                source: None,
            });
        }

        Ok(())
    }
}
