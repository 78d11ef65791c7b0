//! Digest and HMAC computation over canonicalized element sets.
//!
//! The signed elements of a request are sorted lexicographically (byte
//! order) and concatenated with no separator before they are fed to the MAC:
//!
//! ```text
//! HMAC(secret, sort(elements).join(""))
//! ```
//!
//! Sorting makes the MAC independent of the order in which the client and
//! the server happened to assemble the elements.

use std::fmt;
use std::str::FromStr;

use digest::Digest;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// The set of supported hash algorithms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1. Kept for interoperability with older clients.
    Sha1,
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// The canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length in bytes of the digest (and of the HMAC) this algorithm produces.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Compute the one-way digest of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aksk_core::HashAlgorithm;
    ///
    /// let digest = HashAlgorithm::Sha256.digest(b"");
    /// assert_eq!(
    ///     hex::encode(digest),
    ///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Compute the HMAC of the canonicalized `elements` keyed by `secret`.
    #[must_use]
    pub fn hmac<S: AsRef<str>>(self, secret: &[u8], elements: &[S]) -> Vec<u8> {
        let message = canonicalize(elements);
        match self {
            Self::Sha1 => hmac_sha1(secret, message.as_bytes()),
            Self::Sha256 => hmac_sha256(secret, message.as_bytes()),
            Self::Sha512 => hmac_sha512(secret, message.as_bytes()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown hash algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm: {0}")]
pub struct UnknownHashAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnknownHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(UnknownHashAlgorithm(s.to_owned())),
        }
    }
}

/// Sort the elements ascending and concatenate them with no separator.
///
/// # Examples
///
/// ```
/// use aksk_core::hash::canonicalize;
///
/// assert_eq!(canonicalize(&["b", "", "a"]), "ab");
/// ```
#[must_use]
pub fn canonicalize<S: AsRef<str>>(elements: &[S]) -> String {
    let mut sorted: Vec<&str> = elements.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.concat()
}

fn hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;

    use super::*;

    #[test]
    fn test_should_match_known_hmac_fixture() {
        let mac = HashAlgorithm::Sha256.hmac(b"123", &["123456", "helloworld"]);
        assert_eq!(
            BASE64.encode(mac),
            "TwcsQLXoVS8PeAJYptZqZuCVHfIkMWwuWF4k0EvKRVA="
        );
    }

    #[test]
    fn test_should_be_independent_of_element_order() {
        let secret = b"secret";
        let forward = HashAlgorithm::Sha256.hmac(secret, &["a", "b", "c"]);
        let reverse = HashAlgorithm::Sha256.hmac(secret, &["c", "b", "a"]);
        let shuffled = HashAlgorithm::Sha256.hmac(secret, &["b", "c", "a"]);
        assert_eq!(forward, reverse);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_should_change_mac_when_element_changes() {
        let original = HashAlgorithm::Sha256.hmac(b"123", &["123456", "helloworld"]);
        let mutated = HashAlgorithm::Sha256.hmac(b"123", &["123456", "helloworld!"]);
        assert_ne!(original, mutated);
    }

    #[test]
    fn test_should_ignore_empty_elements_in_concatenation() {
        assert_eq!(canonicalize(&["b", "a", ""]), canonicalize(&["a", "b"]));
        assert_eq!(
            HashAlgorithm::Sha256.hmac(b"k", &["x", ""]),
            HashAlgorithm::Sha256.hmac(b"k", &["x"])
        );
    }

    #[test]
    fn test_should_sort_by_bytes() {
        assert_eq!(canonicalize(&["b", "B", "a", "1"]), "1Bab");
    }

    #[test]
    fn test_should_produce_expected_output_lengths() {
        for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
            assert_eq!(algorithm.digest(b"data").len(), algorithm.output_len());
            assert_eq!(
                algorithm.hmac(b"key", &["data"]).len(),
                algorithm.output_len()
            );
        }
    }

    #[test]
    fn test_should_digest_helloworld_with_sha256() {
        assert_eq!(
            BASE64.encode(HashAlgorithm::Sha256.digest(b"helloworld")),
            "k2oYXKqiZrucvpgengXLeM1zKwsygOuURBK7b4+PB68="
        );
    }

    #[test]
    fn test_should_parse_hash_algorithm_names() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
