//! Compact token codec: three base64url segments joined by `.`.
//!
//! The header and payload segments are base64url-encoded JSON; the third
//! segment is the base64url encoding of the raw signature bytes, which cross
//! the key layer as lowercase hex strings.

use base64::engine::{general_purpose::URL_SAFE_NO_PAD as BASE64_URL_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VerifyError};
use crate::keys::{PublicKey, SecretKey};

/// Header present on every signed segment.
///
/// `alg` carries both the algorithm family and the key size, e.g. `RS256`
/// or `DS128`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
}

/// A parsed compact token, retaining the raw segments so the exact signed
/// bytes can be reconstructed for verification.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub header: Header,
    pub payload: Value,
    pub header_segment: String,
    pub payload_segment: String,
    /// Signature as lowercase hex. Length is treated as variable; the key
    /// layer zero-pads on the left before use.
    pub signature_hex: String,
}

impl SignedToken {
    /// The exact ASCII bytes the signature was computed over.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }

    /// Checks the signature against `key`. Returns `false` for any
    /// cryptographically invalid signature.
    pub fn verify(&self, key: &PublicKey) -> bool {
        key.verify(self.signing_input().as_bytes(), &self.signature_hex)
    }
}

pub(crate) fn base64url_encode(data: &[u8]) -> String {
    BASE64_URL_NO_PAD.encode(data)
}

pub(crate) fn base64url_decode(segment: &str) -> Result<Vec<u8>> {
    BASE64_URL_NO_PAD
        .decode(segment)
        .map_err(|e| VerifyError::MalformedToken(format!("invalid base64url segment: {e}")))
}

/// Decodes a hex string into bytes, left-padding odd-length input with a
/// single `0` nibble. Signatures from other implementations may arrive with
/// leading zeros stripped.
pub(crate) fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let padded;
    let even = if hex_str.len() % 2 == 0 {
        hex_str
    } else {
        padded = format!("0{hex_str}");
        &padded
    };
    hex::decode(even).map_err(|e| VerifyError::MalformedToken(format!("invalid signature hex: {e}")))
}

/// Serializes and signs `payload`, producing the dot-joined compact form.
///
/// The header is derived from the secret key, so the token always declares
/// the algorithm that actually signed it.
pub fn sign(payload: &Value, secret_key: &SecretKey) -> Result<String> {
    let header = Header {
        alg: secret_key.alg_header(),
    };
    let header_json = serde_json::to_string(&header)
        .map_err(|e| VerifyError::Crypto(format!("header serialization failed: {e}")))?;
    let payload_json = serde_json::to_string(payload)
        .map_err(|e| VerifyError::Crypto(format!("payload serialization failed: {e}")))?;

    let header_segment = base64url_encode(header_json.as_bytes());
    let payload_segment = base64url_encode(payload_json.as_bytes());
    let signing_input = format!("{header_segment}.{payload_segment}");

    log::trace!("signing token with alg {}", header.alg);
    let signature_hex = secret_key.sign(signing_input.as_bytes())?;
    let signature_segment = base64url_encode(&hex_to_bytes(&signature_hex)?);

    Ok(format!("{signing_input}.{signature_segment}"))
}

/// Splits and decodes a compact token without checking its signature.
pub fn parse(raw: &str) -> Result<SignedToken> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 3 {
        return Err(VerifyError::MalformedToken(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    let header_bytes = base64url_decode(parts[0])?;
    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|e| VerifyError::MalformedToken(format!("invalid header JSON: {e}")))?;

    let payload_bytes = base64url_decode(parts[1])?;
    let payload: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| VerifyError::MalformedToken(format!("invalid payload JSON: {e}")))?;

    let signature_hex = hex::encode(base64url_decode(parts[2])?);

    Ok(SignedToken {
        header,
        payload,
        header_segment: parts[0].to_owned(),
        payload_segment: parts[1].to_owned(),
        signature_hex,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::keys::{generate_key_pair, Algorithm};

    #[test]
    fn sign_parse_verify_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let kp = generate_key_pair(Algorithm::RS, 64).unwrap();

        let payload = json!({"exp": 1234567890000i64, "aud": "http://rp.example"});
        let raw = sign(&payload, &kp.secret_key).unwrap();

        let token = parse(&raw).unwrap();
        assert_eq!(token.header.alg, "RS64");
        assert_eq!(token.payload, payload);
        assert!(token.verify(&kp.public_key));
    }

    #[test]
    fn two_segments_is_malformed() {
        let result = parse("eyJhbGciOiJSUzY0In0.eyJmb28iOiJiYXIifQ");
        assert!(matches!(result, Err(VerifyError::MalformedToken(_))));
    }

    #[test]
    fn non_json_segment_is_malformed() {
        let garbage = base64url_encode(b"not json at all");
        let raw = format!("{garbage}.{garbage}.{garbage}");
        assert!(matches!(parse(&raw), Err(VerifyError::MalformedToken(_))));
    }

    #[test]
    fn invalid_base64url_is_malformed() {
        assert!(matches!(
            parse("a!b.cd.ef"),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let raw = sign(&json!({"aud": "http://rp.example"}), &kp.secret_key).unwrap();

        let mut token = parse(&raw).unwrap();
        // Re-encode a payload differing in a single bit.
        token.payload_segment = base64url_encode(br#"{"aud":"http://rq.example"}"#);
        assert!(!token.verify(&kp.public_key));
    }

    #[test]
    fn odd_length_hex_is_padded() {
        let bytes = hex_to_bytes("abc").unwrap();
        assert_eq!(bytes, vec![0x0a, 0xbc]);
    }
}
