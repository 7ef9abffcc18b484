//! Chain verification: walks a bundle's certificate chain in order,
//! resolves the root issuer's key, and validates the terminal assertion.
//!
//! Verification is a pure function of `(bundle, now, resolver)`: no
//! module-level state, so concurrent verifications need no locking as long
//! as the resolver itself is stateless or internally synchronized.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::assertion::{self, AssertionParams};
use crate::bundle;
use crate::cert::{self, CertParams};
use crate::error::{Result, VerifyError};
use crate::keys::PublicKey;
use crate::EpochMillis;

/// Resolves an issuer hostname to its published public key.
///
/// Typically backed by a fetch of the issuer's well-known support document;
/// that fetch and its caching are the host application's business. Any
/// resolver failure collapses to `UnknownIssuer` for the verification as a
/// whole. Resolution is the only suspension point in the pipeline.
#[async_trait]
pub trait IssuerKeyResolver: Send + Sync {
    async fn resolve(&self, issuer: &str) -> anyhow::Result<PublicKey>;
}

/// A fixed issuer-to-key map. Useful for a verifier that only trusts its
/// own root, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    keys: HashMap<String, PublicKey>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, issuer: impl Into<String>, key: PublicKey) {
        self.keys.insert(issuer.into(), key);
    }
}

#[async_trait]
impl IssuerKeyResolver for StaticResolver {
    async fn resolve(&self, issuer: &str) -> anyhow::Result<PublicKey> {
        self.keys
            .get(issuer)
            .cloned()
            .ok_or_else(|| anyhow!("no key registered for '{issuer}'"))
    }
}

/// The outcome of a successful bundle verification.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// The certified email, taken from the terminal certificate.
    pub email: String,
    /// The authority that vouched for the email (terminal certificate's
    /// issuer).
    pub issuer: String,
    /// Validated claims of every certificate, root-most first.
    pub certificates: Vec<CertParams>,
    pub assertion: AssertionParams,
}

/// Verifies certificate-chain bundles against an issuer key resolver.
pub struct ChainVerifier<R> {
    resolver: R,
    resolve_timeout: Option<Duration>,
    fallback_issuer: Option<String>,
}

impl<R: IssuerKeyResolver> ChainVerifier<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            resolve_timeout: None,
            fallback_issuer: None,
        }
    }

    /// Bounds issuer-key resolution; on expiry the whole verification fails
    /// with `ResolutionTimeout` instead of hanging.
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    /// Enables the issuer-authority policy: the terminal issuer must either
    /// be this hostname or the domain of the certified email.
    pub fn with_fallback_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.fallback_issuer = Some(issuer.into());
        self
    }

    /// Verifies a bundle at time `now` (epoch milliseconds), optionally
    /// against the relying party's expected audience.
    ///
    /// Certificate links are verified strictly in chain order: link 0
    /// against the resolved root issuer key, each later link against the
    /// subject key certified by its predecessor, and finally the assertion
    /// signature against the terminal certificate's subject key. The first
    /// failing link aborts with its own error; there is no partial success.
    pub async fn verify(
        &self,
        raw_bundle: &str,
        now: EpochMillis,
        expected_audience: Option<&str>,
    ) -> Result<VerifiedIdentity> {
        let bundle = bundle::unbundle(raw_bundle)?;
        log::debug!(
            "verifying bundle with {} certificate(s)",
            bundle.certificates.len()
        );

        let root_cert = bundle.certificates.first().ok_or(VerifyError::EmptyChain)?;
        let root_issuer = cert::issuer_of(root_cert)?;
        let mut verifying_key = self.resolve(&root_issuer).await?;

        let mut certificates = Vec::with_capacity(bundle.certificates.len());
        for (index, raw_cert) in bundle.certificates.iter().enumerate() {
            log::trace!("verifying certificate link {index}");
            let params = cert::verify_with_key(raw_cert, now, &verifying_key)?;
            verifying_key = params.public_key.clone();
            certificates.push(params);
        }

        let (assertion_token, assertion_params) =
            assertion::verify(&bundle.assertion, now, expected_audience)?;
        if !assertion_token.verify(&verifying_key) {
            return Err(VerifyError::InvalidSignature);
        }

        let terminal = certificates.last().ok_or(VerifyError::EmptyChain)?;
        if let Some(fallback) = &self.fallback_issuer {
            check_issuer_authority(&terminal.issuer, &terminal.principal.email, fallback)?;
        }

        log::debug!(
            "bundle verified: '{}' issued by '{}'",
            terminal.principal.email,
            terminal.issuer
        );
        Ok(VerifiedIdentity {
            email: terminal.principal.email.clone(),
            issuer: terminal.issuer.clone(),
            certificates,
            assertion: assertion_params,
        })
    }

    async fn resolve(&self, issuer: &str) -> Result<PublicKey> {
        log::trace!("resolving public key for issuer '{issuer}'");
        let resolution = self.resolver.resolve(issuer);
        let resolved = match self.resolve_timeout {
            Some(timeout) => tokio::time::timeout(timeout, resolution)
                .await
                .map_err(|_| VerifyError::ResolutionTimeout(timeout))?,
            None => resolution.await,
        };
        resolved.map_err(|e| VerifyError::UnknownIssuer {
            issuer: issuer.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// An issuer may vouch for an email when it is the configured fallback
/// authority or when it matches the email's domain.
fn check_issuer_authority(issuer: &str, email: &str, fallback: &str) -> Result<()> {
    let domain = email.rsplit('@').next().unwrap_or(email);
    if issuer == fallback || issuer == domain {
        return Ok(());
    }
    Err(VerifyError::UntrustedIssuer {
        issuer: issuer.to_owned(),
        domain: domain.to_owned(),
    })
}
