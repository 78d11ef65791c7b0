//! Canonical AKSK header names.
//!
//! Header names are matched case-insensitively by the `http` crate; these
//! constants are the lowercase wire form.

/// Client identifier.
pub const ACCESS_KEY: &str = "x-auth-access-key";

/// Unix seconds at signing time, as a decimal string.
pub const TIMESTAMP: &str = "x-auth-timestamp";

/// Encoded HMAC over the signed elements.
pub const SIGNATURE: &str = "x-auth-signature";

/// Encoded digest of the request body. Absent when the body is empty or not
/// hashed.
pub const BODY_HASH: &str = "x-auth-body-hash";

/// Encoded random nonce.
pub const RANDOM_STR: &str = "x-auth-random-str";

/// All AKSK headers, in the order the signer writes them.
pub const ALL: [&str; 5] = [ACCESS_KEY, RANDOM_STR, TIMESTAMP, BODY_HASH, SIGNATURE];

/// Read a header as a string, treating absent or non-ASCII values as empty.
pub(crate) fn header_str<'a>(headers: &'a http::HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
