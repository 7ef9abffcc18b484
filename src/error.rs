use std::time::Duration;

use thiserror::Error;

use crate::EpochMillis;

/// Failure kinds surfaced by signing and verification.
///
/// Every error is terminal: nothing in this crate retries internally, and a
/// failure at any chain link aborts the whole verification with that link's
/// error. Callers that need user-facing text map these variants themselves.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Token is not three dot-joined segments of base64url JSON.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Bundle has fewer than two `~`-separated segments.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// Key material is missing required fields or otherwise unusable.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// Algorithm tag is not recognized by the key registry.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Issuer key resolution produced no key.
    #[error("no public key for issuer '{issuer}': {reason}")]
    UnknownIssuer { issuer: String, reason: String },

    /// Cryptographic signature verification returned false.
    #[error("signature verification failed")]
    InvalidSignature,

    /// Certificate `exp` has passed.
    #[error("certificate expired at {expired_at}, verified at {now}")]
    ExpiredCertificate { expired_at: EpochMillis, now: EpochMillis },

    /// Assertion `exp` has passed.
    #[error("assertion expired at {expired_at}, verified at {now}")]
    ExpiredAssertion { expired_at: EpochMillis, now: EpochMillis },

    /// Assertion audience does not match the relying party's origin.
    #[error("audience mismatch: expected '{expected}', got '{got}'")]
    AudienceMismatch { expected: String, got: String },

    /// Issuer key resolution did not complete in time.
    #[error("issuer key resolution timed out after {0:?}")]
    ResolutionTimeout(Duration),

    /// A bundle with zero certificates; a bare assertion is never trusted.
    #[error("certificate chain is empty")]
    EmptyChain,

    /// Terminal issuer is neither the fallback issuer nor the email domain.
    #[error("issuer '{issuer}' may not vouch for emails from '{domain}'")]
    UntrustedIssuer { issuer: String, domain: String },

    /// Caller supplied inconsistent signing parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Underlying cryptographic operation failed structurally.
    #[error("crypto failure: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
