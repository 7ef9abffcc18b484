//! Assertions: short-lived, audience-bound proofs of possession of the
//! subject secret key.

use serde_json::json;

use crate::audience;
use crate::cert::{require_int, require_str};
use crate::error::{Result, VerifyError};
use crate::keys::{parse_alg, SecretKey};
use crate::token::{self, SignedToken};
use crate::EpochMillis;

/// Claims extracted from a verified assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionParams {
    /// The relying-party origin the assertion is scoped to.
    pub audience: String,
    pub expires_at: EpochMillis,
}

/// Signs an assertion with the subject's secret key.
pub fn sign(audience: &str, expires_at: EpochMillis, subject_secret_key: &SecretKey) -> Result<String> {
    log::debug!("signing assertion for audience '{audience}'");
    let payload = json!({
        "exp": expires_at,
        "aud": audience,
    });
    token::sign(&payload, subject_secret_key)
}

/// Decodes an assertion and checks expiry and (optionally) audience.
///
/// An assertion whose `exp` equals `now` is still valid; one millisecond
/// later it is not. This is the single most security-critical check in the
/// crate: an assertion usable after expiry is an account takeover.
///
/// Signature verification is deliberately not done here; the verifying key
/// comes from the terminal certificate of the chain, so the chain verifier
/// checks the signature against the returned token. Extra payload fields
/// are tolerated for forward compatibility.
pub fn verify(
    raw: &str,
    now: EpochMillis,
    expected_audience: Option<&str>,
) -> Result<(SignedToken, AssertionParams)> {
    let token = token::parse(raw)?;
    parse_alg(&token.header.alg)?;

    let expires_at = require_int(&token.payload, "exp")?;
    if now > expires_at {
        return Err(VerifyError::ExpiredAssertion {
            expired_at: expires_at,
            now,
        });
    }

    let aud = require_str(&token.payload, "aud")?;
    if let Some(expected) = expected_audience {
        audience::compare(&aud, expected)?;
    }

    let params = AssertionParams {
        audience: aud,
        expires_at,
    };
    Ok((token, params))
}
