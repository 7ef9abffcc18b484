//! Certificates: signed statements binding a subject public key to a
//! principal (email) under an issuer's authority, with a validity window.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::IssuerKeyResolver;
use crate::error::{Result, VerifyError};
use crate::keys::{parse_alg, PublicKey, SecretKey};
use crate::token;
use crate::EpochMillis;

/// Payload field holding the serialized subject key.
pub const PUBLIC_KEY_CLAIM: &str = "public-key";

/// The identity a certificate vouches for. Only `email` is recognized;
/// certificates carrying other principal fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Principal {
    pub email: String,
}

/// Validated claims extracted from a certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct CertParams {
    pub issuer: String,
    pub issued_at: EpochMillis,
    pub expires_at: EpochMillis,
    /// The subject key being vouched for.
    pub public_key: PublicKey,
    pub principal: Principal,
}

/// Issues a certificate for `subject_key` under the issuer's authority.
///
/// Reserved fields always win over `extra_payload` on collision.
pub fn certify(
    subject_key: &PublicKey,
    principal: &Principal,
    issuer: &str,
    issued_at: EpochMillis,
    expires_at: EpochMillis,
    extra_payload: Option<&Map<String, Value>>,
    issuer_secret_key: &SecretKey,
) -> Result<String> {
    if issued_at >= expires_at {
        return Err(VerifyError::InvalidParams(format!(
            "issued_at ({issued_at}) must precede expires_at ({expires_at})"
        )));
    }

    log::debug!(
        "certifying '{}' for issuer '{issuer}'",
        principal.email
    );

    let mut payload = extra_payload.cloned().unwrap_or_default();
    payload.insert("iss".into(), Value::from(issuer));
    payload.insert("iat".into(), Value::from(issued_at));
    payload.insert("exp".into(), Value::from(expires_at));
    payload.insert(PUBLIC_KEY_CLAIM.into(), subject_key.to_simple_object()?);
    payload.insert(
        "principal".into(),
        serde_json::to_value(principal)
            .map_err(|e| VerifyError::Crypto(format!("principal serialization failed: {e}")))?,
    );

    token::sign(&Value::Object(payload), issuer_secret_key)
}

/// Reads a certificate's `iss` claim without verifying anything else. The
/// chain verifier needs this before it can resolve the issuer's key.
pub fn issuer_of(raw: &str) -> Result<String> {
    let token = token::parse(raw)?;
    require_str(&token.payload, "iss")
}

/// Verifies a certificate against a known issuer key.
///
/// Check order: decode, algorithm recognition, signature, expiry, subject
/// key deserialization, principal extraction. `iat` is not re-checked;
/// issued-in-the-future certificates are tolerated.
pub fn verify_with_key(
    raw: &str,
    now: EpochMillis,
    issuer_key: &PublicKey,
) -> Result<CertParams> {
    let token = token::parse(raw)?;
    parse_alg(&token.header.alg)?;

    if !token.verify(issuer_key) {
        return Err(VerifyError::InvalidSignature);
    }

    let expires_at = require_int(&token.payload, "exp")?;
    if now > expires_at {
        return Err(VerifyError::ExpiredCertificate {
            expired_at: expires_at,
            now,
        });
    }

    let key_value = token
        .payload
        .get(PUBLIC_KEY_CLAIM)
        .ok_or_else(|| VerifyError::MalformedToken("missing 'public-key' claim".into()))?;
    let public_key = PublicKey::from_simple_object(key_value)?;

    let issuer = require_str(&token.payload, "iss")?;
    let issued_at = require_int(&token.payload, "iat")?;
    let principal_value = token
        .payload
        .get("principal")
        .ok_or_else(|| VerifyError::MalformedToken("missing 'principal' claim".into()))?;
    let principal: Principal = serde_json::from_value(principal_value.clone())
        .map_err(|e| VerifyError::MalformedToken(format!("invalid principal: {e}")))?;

    Ok(CertParams {
        issuer,
        issued_at,
        expires_at,
        public_key,
        principal,
    })
}

/// Verifies a certificate, resolving the issuer key first.
pub async fn verify(
    raw: &str,
    now: EpochMillis,
    resolver: &dyn IssuerKeyResolver,
) -> Result<CertParams> {
    let issuer = issuer_of(raw)?;
    let issuer_key = resolver
        .resolve(&issuer)
        .await
        .map_err(|e| VerifyError::UnknownIssuer {
            issuer: issuer.clone(),
            reason: e.to_string(),
        })?;
    verify_with_key(raw, now, &issuer_key)
}

pub(crate) fn require_str(payload: &Value, field: &str) -> Result<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| VerifyError::MalformedToken(format!("missing or non-string '{field}'")))
}

pub(crate) fn require_int(payload: &Value, field: &str) -> Result<EpochMillis> {
    payload
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| VerifyError::MalformedToken(format!("missing or non-integer '{field}'")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::chain::StaticResolver;
    use crate::keys::{generate_key_pair, Algorithm};

    const NOW: EpochMillis = 1_600_000_000_000;

    fn principal() -> Principal {
        Principal {
            email: "john@example.com".into(),
        }
    }

    #[test]
    fn certify_and_verify() {
        let _ = env_logger::builder().is_test(true).try_init();
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();

        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW + 60_000,
            None,
            &issuer_kp.secret_key,
        )
        .unwrap();

        let params = verify_with_key(&cert, NOW, &issuer_kp.public_key).unwrap();
        assert_eq!(params.issuer, "issuer.com");
        assert_eq!(params.principal.email, "john@example.com");
        assert_eq!(params.public_key, subject_kp.public_key);
        assert_eq!(params.issued_at, NOW);
        assert_eq!(params.expires_at, NOW + 60_000);
    }

    #[test]
    fn issuer_peek() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW + 1,
            None,
            &issuer_kp.secret_key,
        )
        .unwrap();
        assert_eq!(issuer_of(&cert).unwrap(), "issuer.com");
    }

    #[test]
    fn expiry_boundary() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW - 60_000,
            NOW,
            None,
            &issuer_kp.secret_key,
        )
        .unwrap();

        // exp == now is still valid
        assert!(verify_with_key(&cert, NOW, &issuer_kp.public_key).is_ok());
        assert!(matches!(
            verify_with_key(&cert, NOW + 1, &issuer_kp.public_key),
            Err(VerifyError::ExpiredCertificate { .. })
        ));
    }

    #[test]
    fn wrong_issuer_key_is_invalid_signature() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let other_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW + 60_000,
            None,
            &issuer_kp.secret_key,
        )
        .unwrap();

        assert!(matches!(
            verify_with_key(&cert, NOW, &other_kp.public_key),
            Err(VerifyError::InvalidSignature)
        ));
    }

    #[test]
    fn inverted_validity_window_is_rejected() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let result = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW,
            None,
            &issuer_kp.secret_key,
        );
        assert!(matches!(result, Err(VerifyError::InvalidParams(_))));
    }

    #[test]
    fn extra_payload_fields_survive_but_cannot_shadow() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();

        let mut extra = Map::new();
        extra.insert("nonce".into(), json!("abc123"));
        extra.insert("iss".into(), json!("evil.com"));

        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW + 60_000,
            Some(&extra),
            &issuer_kp.secret_key,
        )
        .unwrap();

        let token = crate::token::parse(&cert).unwrap();
        assert_eq!(token.payload["nonce"], "abc123");
        assert_eq!(token.payload["iss"], "issuer.com");
    }

    #[test]
    fn unrecognized_principal_field_is_malformed() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();

        // Hand-build a payload whose principal carries an extra field.
        let payload = json!({
            "iss": "issuer.com",
            "iat": NOW,
            "exp": NOW + 60_000,
            "public-key": subject_kp.public_key.to_simple_object().unwrap(),
            "principal": {"email": "john@example.com", "phone": "555"},
        });
        let raw = crate::token::sign(&payload, &issuer_kp.secret_key).unwrap();

        assert!(matches!(
            verify_with_key(&raw, NOW, &issuer_kp.public_key),
            Err(VerifyError::MalformedToken(_))
        ));
    }

    #[tokio::test]
    async fn resolver_backed_verification() {
        let issuer_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let subject_kp = generate_key_pair(Algorithm::RS, 64).unwrap();
        let cert = certify(
            &subject_kp.public_key,
            &principal(),
            "issuer.com",
            NOW,
            NOW + 60_000,
            None,
            &issuer_kp.secret_key,
        )
        .unwrap();

        let mut resolver = StaticResolver::new();
        resolver.insert("issuer.com", issuer_kp.public_key.clone());
        assert!(verify(&cert, NOW, &resolver).await.is_ok());

        let empty = StaticResolver::new();
        assert!(matches!(
            verify(&cert, NOW, &empty).await,
            Err(VerifyError::UnknownIssuer { .. })
        ));
    }
}
