use rand::rngs::OsRng;
use rsa::sha2::{Digest, Sha256};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::Pkcs1v15Sign;

use crate::error::{Result, VerifyError};
use crate::keys::parse_bigint;
use crate::token::hex_to_bytes;

/// RSA public key, verifying RSASSA-PKCS#1 v1.5 / SHA-256 signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct RsaPublicKey {
    key: rsa::RsaPublicKey,
}

impl RsaPublicKey {
    /// Builds a key from decimal-string modulus and exponent.
    pub fn from_parts(n: &str, e: &str) -> Result<Self> {
        let n = parse_bigint(n, 10, "n")?;
        let e = parse_bigint(e, 10, "e")?;
        let key = rsa::RsaPublicKey::new(n, e)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid RSA public key: {e}")))?;
        Ok(Self { key })
    }

    pub(crate) fn from_inner(key: rsa::RsaPublicKey) -> Self {
        Self { key }
    }

    /// Modulus length in bytes.
    pub fn keysize(&self) -> usize {
        self.key.size()
    }

    pub fn n(&self) -> String {
        self.key.n().to_str_radix(10)
    }

    pub fn e(&self) -> String {
        self.key.e().to_str_radix(10)
    }

    /// Verifies a hex signature over `message`, left-padding the signature
    /// to the modulus width first.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        let Ok(sig) = hex_to_bytes(signature_hex) else {
            return false;
        };
        let size = self.key.size();
        if sig.len() > size {
            return false;
        }
        let mut padded = vec![0u8; size - sig.len()];
        padded.extend_from_slice(&sig);

        let digest = Sha256::digest(message);
        self.key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &padded)
            .is_ok()
    }
}

/// RSA secret key, producing RSASSA-PKCS#1 v1.5 / SHA-256 signatures.
#[derive(Clone)]
pub struct RsaSecretKey {
    key: rsa::RsaPrivateKey,
}

impl std::fmt::Debug for RsaSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSecretKey")
            .field("keysize", &self.keysize())
            .finish_non_exhaustive()
    }
}

impl RsaSecretKey {
    /// Generates a fresh key with the given modulus size in bits.
    pub fn generate(bits: usize) -> Result<Self> {
        let key = rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| VerifyError::Crypto(format!("RSA key generation failed: {e}")))?;
        Ok(Self { key })
    }

    /// Rebuilds a key from decimal-string components; the prime factors are
    /// recovered from (n, e, d).
    pub fn from_parts(n: &str, e: &str, d: &str) -> Result<Self> {
        let n = parse_bigint(n, 10, "n")?;
        let e = parse_bigint(e, 10, "e")?;
        let d = parse_bigint(d, 10, "d")?;
        let key = rsa::RsaPrivateKey::from_components(n, e, d, Vec::new())
            .map_err(|e| VerifyError::MalformedKey(format!("invalid RSA secret key: {e}")))?;
        Ok(Self { key })
    }

    pub fn keysize(&self) -> usize {
        self.key.size()
    }

    pub fn n(&self) -> String {
        self.key.n().to_str_radix(10)
    }

    pub fn e(&self) -> String {
        self.key.e().to_str_radix(10)
    }

    pub fn d(&self) -> String {
        self.key.d().to_str_radix(10)
    }

    /// Signs `message`, returning the signature as lowercase hex.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let digest = Sha256::digest(message);
        let sig = self
            .key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| VerifyError::Crypto(format!("RSA signing failed: {e}")))?;
        Ok(hex::encode(sig))
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from_inner(self.key.to_public_key())
    }
}
