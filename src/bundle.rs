//! Bundle protocol: an ordered certificate chain plus exactly one
//! assertion, joined into a single wire string.

use crate::error::{Result, VerifyError};

/// Separator between bundle segments. Never appears inside a compact token
/// (whose alphabet is base64url plus `.`).
pub const SEPARATOR: char = '~';

/// An unbundled chain: certificates in issuance order (root-most first),
/// then the assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub certificates: Vec<String>,
    pub assertion: String,
}

/// Joins certificates and an assertion into the wire form.
///
/// A chain of zero certificates is invalid; a bare self-issued assertion is
/// never trusted.
pub fn bundle(certificates: &[String], assertion: &str) -> Result<String> {
    if certificates.is_empty() {
        return Err(VerifyError::EmptyChain);
    }
    let mut segments: Vec<&str> = certificates.iter().map(String::as_str).collect();
    segments.push(assertion);
    Ok(segments.join(&SEPARATOR.to_string()))
}

/// Splits a bundle string back into certificates and assertion.
pub fn unbundle(raw: &str) -> Result<Bundle> {
    let mut segments: Vec<String> = raw.split(SEPARATOR).map(str::to_owned).collect();
    if segments.len() < 2 {
        return Err(VerifyError::MalformedBundle(format!(
            "expected at least 2 segments, found {}",
            segments.len()
        )));
    }
    let assertion = segments
        .pop()
        .ok_or_else(|| VerifyError::MalformedBundle("empty bundle".into()))?;
    Ok(Bundle {
        certificates: segments,
        assertion,
    })
}
