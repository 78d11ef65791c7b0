//! Reversible text encodings for MACs, digests, and nonces.
//!
//! Two encodings are built in: padded standard base64 ([`Base64Encoder`]) and
//! lowercase hex ([`HexEncoder`]). [`Encoding`] selects one of them and is
//! what an [`Auth`](crate::Auth) context stores.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::DecodeError;

/// A bijective byte-to-text encoding.
pub trait Encoder {
    /// Encode raw bytes as a string.
    fn encode(&self, bytes: &[u8]) -> String;

    /// Decode a string produced by [`encode`](Encoder::encode).
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input uses the wrong alphabet or has
    /// bad padding.
    fn decode(&self, input: &str) -> Result<Vec<u8>, DecodeError>;
}

/// Standard-alphabet, padded base64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base64Encoder;

impl Encoder for Base64Encoder {
    fn encode(&self, bytes: &[u8]) -> String {
        BASE64.encode(bytes)
    }

    fn decode(&self, input: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(BASE64.decode(input)?)
    }
}

/// Lowercase hexadecimal. Decoding accepts either case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexEncoder;

impl Encoder for HexEncoder {
    fn encode(&self, bytes: &[u8]) -> String {
        hex::encode(bytes)
    }

    fn decode(&self, input: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(hex::decode(input)?)
    }
}

/// The set of supported encodings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// [`Base64Encoder`].
    #[default]
    Base64,
    /// [`HexEncoder`].
    Hex,
}

impl Encoding {
    /// The canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::Hex => "hex",
        }
    }
}

impl Encoder for Encoding {
    fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Base64 => Base64Encoder.encode(bytes),
            Self::Hex => HexEncoder.encode(bytes),
        }
    }

    fn decode(&self, input: &str) -> Result<Vec<u8>, DecodeError> {
        match self {
            Self::Base64 => Base64Encoder.decode(input),
            Self::Hex => HexEncoder.decode(input),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown encoding name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding: {0}")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            _ => Err(UnknownEncoding(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&[u8]] = &[b"", b"\x00", b"helloworld", b"\xff\xfe\x00\x01\x80", b"ab"];

    #[test]
    fn test_should_roundtrip_base64() {
        for sample in SAMPLES {
            let encoded = Base64Encoder.encode(sample);
            assert_eq!(Base64Encoder.decode(&encoded).unwrap(), *sample);
        }
    }

    #[test]
    fn test_should_roundtrip_hex() {
        for sample in SAMPLES {
            let encoded = HexEncoder.encode(sample);
            assert_eq!(HexEncoder.decode(&encoded).unwrap(), *sample);
        }
    }

    #[test]
    fn test_should_encode_known_values() {
        assert_eq!(Encoding::Base64.encode(b"helloworld"), "aGVsbG93b3JsZA==");
        assert_eq!(Encoding::Hex.encode(b"\xab\x01"), "ab01");
    }

    #[test]
    fn test_should_accept_uppercase_hex() {
        assert_eq!(HexEncoder.decode("AB01").unwrap(), vec![0xab, 0x01]);
    }

    #[test]
    fn test_should_reject_invalid_base64() {
        assert!(matches!(
            Base64Encoder.decode("not base64!"),
            Err(DecodeError::Base64(_))
        ));
        // Missing padding.
        assert!(Base64Encoder.decode("aGVsbG93b3JsZA").is_err());
    }

    #[test]
    fn test_should_reject_invalid_hex() {
        assert!(matches!(HexEncoder.decode("zz"), Err(DecodeError::Hex(_))));
        assert!(HexEncoder.decode("abc").is_err());
    }

    #[test]
    fn test_should_parse_encoding_names() {
        assert_eq!("base64".parse::<Encoding>().unwrap(), Encoding::Base64);
        assert_eq!("HEX".parse::<Encoding>().unwrap(), Encoding::Hex);
        assert!("base32".parse::<Encoding>().is_err());
        assert_eq!(Encoding::Hex.to_string(), "hex");
    }

    #[test]
    fn test_should_serialize_encoding_lowercase() {
        let json = serde_json::to_string(&Encoding::Base64).unwrap();
        assert_eq!(json, "\"base64\"");
        let parsed: Encoding = serde_json::from_str("\"hex\"").unwrap();
        assert_eq!(parsed, Encoding::Hex);
    }
}
