//! A small certifying authority: a hostname plus the key pair it signs
//! certificates with.

use crate::cert::{self, Principal};
use crate::chain::StaticResolver;
use crate::error::Result;
use crate::keys::{KeyPair, PublicKey};
use crate::EpochMillis;

pub struct CertAuthority {
    hostname: String,
    key_pair: KeyPair,
}

impl CertAuthority {
    pub fn new(hostname: impl Into<String>, key_pair: KeyPair) -> Self {
        Self {
            hostname: hostname.into(),
            key_pair,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key_pair.public_key
    }

    /// Certifies `subject_key` as belonging to `email` under this
    /// authority's hostname.
    pub fn certify(
        &self,
        email: &str,
        subject_key: &PublicKey,
        issued_at: EpochMillis,
        expires_at: EpochMillis,
    ) -> Result<String> {
        cert::certify(
            subject_key,
            &Principal {
                email: email.to_owned(),
            },
            &self.hostname,
            issued_at,
            expires_at,
            None,
            &self.key_pair.secret_key,
        )
    }

    /// A resolver that answers only for this authority's own hostname.
    pub fn resolver(&self) -> StaticResolver {
        let mut resolver = StaticResolver::new();
        resolver.insert(self.hostname.clone(), self.key_pair.public_key.clone());
        resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion;
    use crate::bundle::bundle;
    use crate::chain::ChainVerifier;
    use crate::keys::{generate_key_pair, Algorithm};

    const NOW: EpochMillis = 1_600_000_000_000;

    #[tokio::test]
    async fn authority_certifies_and_resolves_itself() {
        let _ = env_logger::builder().is_test(true).try_init();
        let root = generate_key_pair(Algorithm::RS, 64).unwrap();
        let authority = CertAuthority::new("login.example.org", root);

        let user = generate_key_pair(Algorithm::RS, 64).unwrap();
        let cert = authority
            .certify("alice@login.example.org", &user.public_key, NOW, NOW + 60_000)
            .unwrap();
        let assertion = assertion::sign("http://rp.com", NOW + 60_000, &user.secret_key).unwrap();
        let raw = bundle(&[cert], &assertion).unwrap();

        let verifier = ChainVerifier::new(authority.resolver());
        let identity = verifier.verify(&raw, NOW, Some("http://rp.com")).await.unwrap();
        assert_eq!(identity.email, "alice@login.example.org");
        assert_eq!(identity.issuer, "login.example.org");
    }
}
