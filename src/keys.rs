//! Key abstraction: uniform sign/verify over heterogeneous algorithms.
//!
//! Keys round-trip to a plain "simple object" form tagged by `algorithm`,
//! the same shape the wire format embeds in certificate payloads. Adding an
//! algorithm means adding a variant here and a submodule; the certificate,
//! assertion, and bundle layers dispatch on the enum and never change.

/// DSA keys (SHA-1 or SHA-256 by subgroup size)
pub mod dsa_key;
/// RSA keys (RSASSA-PKCS#1 v1.5 with SHA-256)
pub mod rsa_key;

use num_bigint_dig::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use dsa_key::{DsaPublicKey, DsaSecretKey};
pub use rsa_key::{RsaPublicKey, RsaSecretKey};

use crate::error::{Result, VerifyError};

/// Supported algorithm families.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
pub enum Algorithm {
    /// RSASSA-PKCS#1 v1.5 with SHA-256
    RS,
    /// DSA with SHA-1 (160-bit subgroup) or SHA-256 (256-bit subgroup)
    DS,
}

/// Splits a header tag like `RS256` or `DS128` into family and key size.
pub fn parse_alg(alg: &str) -> Result<(Algorithm, usize)> {
    let digits = alg
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| VerifyError::UnsupportedAlgorithm(alg.to_owned()))?;
    let (family, size) = alg.split_at(digits);
    let algorithm: Algorithm = family
        .parse()
        .map_err(|_| VerifyError::UnsupportedAlgorithm(alg.to_owned()))?;
    let keysize: usize = size
        .parse()
        .map_err(|_| VerifyError::UnsupportedAlgorithm(alg.to_owned()))?;
    Ok((algorithm, keysize))
}

/// Wire form of a public key: a flat object tagged by `algorithm`.
///
/// RSA parameters are decimal strings, DSA parameters lowercase hex,
/// matching what certified keys look like inside `public-key` claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
enum PublicKeyWire {
    RS { n: String, e: String },
    DS { p: String, q: String, g: String, y: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
enum SecretKeyWire {
    RS { n: String, e: String, d: String },
    DS { p: String, q: String, g: String, x: String },
}

/// A public key of any supported algorithm.
#[derive(Debug, Clone)]
pub enum PublicKey {
    RS(RsaPublicKey),
    DS(DsaPublicKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PublicKey::RS(_) => Algorithm::RS,
            PublicKey::DS(_) => Algorithm::DS,
        }
    }

    /// Key size tag: modulus (RS) or prime p (DS) length in bytes.
    pub fn keysize(&self) -> usize {
        match self {
            PublicKey::RS(key) => key.keysize(),
            PublicKey::DS(key) => key.keysize(),
        }
    }

    /// Header tag for tokens verified by this key, e.g. `RS256`.
    pub fn alg_header(&self) -> String {
        format!("{}{}", self.algorithm(), self.keysize())
    }

    /// Verifies `signature_hex` over `message`.
    ///
    /// Returns `false` for any cryptographically invalid signature; the hex
    /// string is zero-padded on the left to the expected width first, since
    /// other implementations may strip leading zeros.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        match self {
            PublicKey::RS(key) => key.verify(message, signature_hex),
            PublicKey::DS(key) => key.verify(message, signature_hex),
        }
    }

    /// Round-trips to the plain `{algorithm, ...params}` object.
    pub fn to_simple_object(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| VerifyError::MalformedKey(e.to_string()))
    }

    /// Parses a simple object, validating that all required fields are
    /// present and well-formed.
    pub fn from_simple_object(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| VerifyError::MalformedKey(e.to_string()))
    }

    fn to_wire(&self) -> PublicKeyWire {
        match self {
            PublicKey::RS(key) => PublicKeyWire::RS {
                n: key.n(),
                e: key.e(),
            },
            PublicKey::DS(key) => PublicKeyWire::DS {
                p: key.p(),
                q: key.q(),
                g: key.g(),
                y: key.y(),
            },
        }
    }

    fn from_wire(wire: PublicKeyWire) -> Result<Self> {
        match wire {
            PublicKeyWire::RS { n, e } => Ok(PublicKey::RS(RsaPublicKey::from_parts(&n, &e)?)),
            PublicKeyWire::DS { p, q, g, y } => {
                Ok(PublicKey::DS(DsaPublicKey::from_parts(&p, &q, &g, &y)?))
            }
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_wire() == other.to_wire()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = PublicKeyWire::deserialize(deserializer)?;
        PublicKey::from_wire(wire).map_err(serde::de::Error::custom)
    }
}

/// A secret key of any supported algorithm.
#[derive(Debug, Clone)]
pub enum SecretKey {
    RS(RsaSecretKey),
    DS(DsaSecretKey),
}

impl SecretKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            SecretKey::RS(_) => Algorithm::RS,
            SecretKey::DS(_) => Algorithm::DS,
        }
    }

    pub fn keysize(&self) -> usize {
        match self {
            SecretKey::RS(key) => key.keysize(),
            SecretKey::DS(key) => key.keysize(),
        }
    }

    /// Header tag for tokens signed by this key, e.g. `DS128`.
    pub fn alg_header(&self) -> String {
        format!("{}{}", self.algorithm(), self.keysize())
    }

    /// Signs `message`, returning the signature as lowercase hex.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        match self {
            SecretKey::RS(key) => key.sign(message),
            SecretKey::DS(key) => key.sign(message),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            SecretKey::RS(key) => PublicKey::RS(key.public_key()),
            SecretKey::DS(key) => PublicKey::DS(key.public_key()),
        }
    }

    fn to_wire(&self) -> SecretKeyWire {
        match self {
            SecretKey::RS(key) => SecretKeyWire::RS {
                n: key.n(),
                e: key.e(),
                d: key.d(),
            },
            SecretKey::DS(key) => SecretKeyWire::DS {
                p: key.p(),
                q: key.q(),
                g: key.g(),
                x: key.x(),
            },
        }
    }

    fn from_wire(wire: SecretKeyWire) -> Result<Self> {
        match wire {
            SecretKeyWire::RS { n, e, d } => {
                Ok(SecretKey::RS(RsaSecretKey::from_parts(&n, &e, &d)?))
            }
            SecretKeyWire::DS { p, q, g, x } => {
                Ok(SecretKey::DS(DsaSecretKey::from_parts(&p, &q, &g, &x)?))
            }
        }
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = SecretKeyWire::deserialize(deserializer)?;
        SecretKey::from_wire(wire).map_err(serde::de::Error::custom)
    }
}

/// A generated or loaded public/secret key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPair {
    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,
    #[serde(rename = "secretKey")]
    pub secret_key: SecretKey,
}

/// Generates a fresh key pair.
///
/// Supported sizes: RS 64/128/256 (modulus bits = size × 8) and DS 128
/// (1024/160, SHA-1) or 256 (2048/256, SHA-256). Anything else fails with
/// `UnsupportedAlgorithm`.
pub fn generate_key_pair(algorithm: Algorithm, keysize: usize) -> Result<KeyPair> {
    log::debug!("generating {algorithm}{keysize} key pair");
    let secret_key = match (algorithm, keysize) {
        (Algorithm::RS, 64 | 128 | 256) => SecretKey::RS(RsaSecretKey::generate(keysize * 8)?),
        (Algorithm::DS, 128 | 256) => SecretKey::DS(DsaSecretKey::generate(keysize)?),
        _ => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "{algorithm}{keysize}"
            )))
        }
    };
    Ok(KeyPair {
        public_key: secret_key.public_key(),
        secret_key,
    })
}

pub(crate) fn parse_bigint(value: &str, radix: u32, field: &str) -> Result<BigUint> {
    BigUint::parse_bytes(value.as_bytes(), radix)
        .ok_or_else(|| VerifyError::MalformedKey(format!("invalid value for '{field}'")))
}

/// Hex-encodes a big integer left-padded with zeros to `width` bytes.
pub(crate) fn to_padded_hex(value: &BigUint, width: usize) -> String {
    let hex_str = value.to_str_radix(16);
    format!("{hex_str:0>pad$}", pad = width * 2)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_alg_tags() {
        assert_eq!(parse_alg("RS256").unwrap(), (Algorithm::RS, 256));
        assert_eq!(parse_alg("DS128").unwrap(), (Algorithm::DS, 128));
        assert!(matches!(
            parse_alg("ES256"),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            parse_alg("RS"),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn unknown_keysize_is_unsupported() {
        assert!(matches!(
            generate_key_pair(Algorithm::RS, 100),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            generate_key_pair(Algorithm::DS, 64),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn rsa_simple_object_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let kp = generate_key_pair(Algorithm::RS, 64).unwrap();

        let obj = kp.public_key.to_simple_object().unwrap();
        assert_eq!(obj["algorithm"], "RS");
        let restored = PublicKey::from_simple_object(&obj).unwrap();
        assert_eq!(restored, kp.public_key);
        assert_eq!(restored.alg_header(), "RS64");
    }

    #[test]
    fn missing_field_is_malformed_key() {
        let result = PublicKey::from_simple_object(&json!({"algorithm": "RS", "n": "12345"}));
        assert!(matches!(result, Err(VerifyError::MalformedKey(_))));
    }

    #[test]
    fn unknown_algorithm_tag_is_malformed_key() {
        let result = PublicKey::from_simple_object(&json!({"algorithm": "EC", "x": "1", "y": "2"}));
        assert!(matches!(result, Err(VerifyError::MalformedKey(_))));
    }

    #[test]
    fn non_numeric_param_is_malformed_key() {
        let result =
            PublicKey::from_simple_object(&json!({"algorithm": "RS", "n": "xyz", "e": "65537"}));
        assert!(matches!(result, Err(VerifyError::MalformedKey(_))));
    }

    #[test]
    fn sign_verify_and_cross_key_rejection() {
        let kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let other = generate_key_pair(Algorithm::RS, 64).unwrap();

        let sig = kp.secret_key.sign(b"hello world").unwrap();
        assert!(kp.public_key.verify(b"hello world", &sig));
        assert!(!kp.public_key.verify(b"hello worlds", &sig));
        assert!(!other.public_key.verify(b"hello world", &sig));
    }

    #[test]
    fn secret_key_round_trips_through_wire_form() {
        let kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let value = serde_json::to_value(&kp.secret_key).unwrap();
        let restored: SecretKey = serde_json::from_value(value).unwrap();

        let sig = restored.sign(b"payload").unwrap();
        assert!(kp.public_key.verify(b"payload", &sig));
    }

    #[test]
    fn dsa_generate_sign_verify() {
        let _ = env_logger::builder().is_test(true).try_init();
        let kp = generate_key_pair(Algorithm::DS, 128).unwrap();
        assert_eq!(kp.secret_key.alg_header(), "DS128");

        let sig = kp.secret_key.sign(b"dsa message").unwrap();
        assert!(kp.public_key.verify(b"dsa message", &sig));
        assert!(!kp.public_key.verify(b"dsa messag3", &sig));

        let obj = kp.public_key.to_simple_object().unwrap();
        assert_eq!(obj["algorithm"], "DS");
        let restored = PublicKey::from_simple_object(&obj).unwrap();
        assert!(restored.verify(b"dsa message", &sig));
    }
}
