use dsa::{Components, KeySize, Signature, SigningKey, VerifyingKey};
use num_bigint_dig::BigUint;
use rand::rngs::OsRng;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use signature::{DigestSigner, DigestVerifier};

use crate::error::{Result, VerifyError};
use crate::keys::{parse_bigint, to_padded_hex};

// The digest follows the subgroup size: 160-bit q pairs with SHA-1,
// larger subgroups with SHA-256.
fn sha1_subgroup(q: &BigUint) -> bool {
    q.bits() <= 160
}

fn byte_width(value: &BigUint) -> usize {
    (value.bits() + 7) / 8
}

/// DSA public key.
#[derive(Debug, Clone)]
pub struct DsaPublicKey {
    key: VerifyingKey,
}

impl DsaPublicKey {
    /// Builds a key from lowercase-hex domain parameters and public value.
    pub fn from_parts(p: &str, q: &str, g: &str, y: &str) -> Result<Self> {
        let p = parse_bigint(p, 16, "p")?;
        let q = parse_bigint(q, 16, "q")?;
        let g = parse_bigint(g, 16, "g")?;
        let y = parse_bigint(y, 16, "y")?;
        let components = Components::from_components(p, q, g)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid DSA parameters: {e}")))?;
        let key = VerifyingKey::from_components(components, y)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid DSA public key: {e}")))?;
        Ok(Self { key })
    }

    pub(crate) fn from_inner(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Prime p length in bytes.
    pub fn keysize(&self) -> usize {
        byte_width(self.key.components().p())
    }

    pub fn p(&self) -> String {
        self.key.components().p().to_str_radix(16)
    }

    pub fn q(&self) -> String {
        self.key.components().q().to_str_radix(16)
    }

    pub fn g(&self) -> String {
        self.key.components().g().to_str_radix(16)
    }

    pub fn y(&self) -> String {
        self.key.y().to_str_radix(16)
    }

    /// Verifies a hex signature (r and s concatenated at fixed width).
    ///
    /// Shorter input is left-padded with zeros before splitting, so
    /// signatures with stripped leading zeros still verify.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        let q = self.key.components().q().clone();
        let expected = byte_width(&q) * 4; // two hex chars per byte, r then s
        if signature_hex.len() > expected
            || !signature_hex.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return false;
        }
        let padded = format!("{sig:0>width$}", sig = signature_hex, width = expected);
        let (r_hex, s_hex) = padded.split_at(expected / 2);

        let Some(r) = BigUint::parse_bytes(r_hex.as_bytes(), 16) else {
            return false;
        };
        let Some(s) = BigUint::parse_bytes(s_hex.as_bytes(), 16) else {
            return false;
        };
        let Ok(sig) = Signature::from_components(r, s) else {
            return false;
        };

        if sha1_subgroup(&q) {
            let mut digest = Sha1::new();
            digest.update(message);
            self.key.verify_digest(digest, &sig).is_ok()
        } else {
            let mut digest = Sha256::new();
            digest.update(message);
            self.key.verify_digest(digest, &sig).is_ok()
        }
    }
}

/// DSA secret key.
#[derive(Clone)]
pub struct DsaSecretKey {
    key: SigningKey,
}

impl std::fmt::Debug for DsaSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaSecretKey")
            .field("keysize", &self.keysize())
            .finish_non_exhaustive()
    }
}

impl DsaSecretKey {
    /// Generates fresh domain parameters and a key for the given size tag
    /// (128 for L=1024/N=160, 256 for L=2048/N=256).
    #[allow(deprecated)]
    pub fn generate(keysize: usize) -> Result<Self> {
        let key_size = match keysize {
            128 => KeySize::DSA_1024_160,
            256 => KeySize::DSA_2048_256,
            _ => return Err(VerifyError::UnsupportedAlgorithm(format!("DS{keysize}"))),
        };
        let components = Components::generate(&mut OsRng, key_size);
        let key = SigningKey::generate(&mut OsRng, components);
        Ok(Self { key })
    }

    /// Rebuilds a key from lowercase-hex parameters; y is recomputed from x.
    pub fn from_parts(p: &str, q: &str, g: &str, x: &str) -> Result<Self> {
        let p = parse_bigint(p, 16, "p")?;
        let q = parse_bigint(q, 16, "q")?;
        let g = parse_bigint(g, 16, "g")?;
        let x = parse_bigint(x, 16, "x")?;

        let y = g.modpow(&x, &p);
        let components = Components::from_components(p, q, g)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid DSA parameters: {e}")))?;
        let verifying_key = VerifyingKey::from_components(components, y)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid DSA public value: {e}")))?;
        let key = SigningKey::from_components(verifying_key, x)
            .map_err(|e| VerifyError::MalformedKey(format!("invalid DSA secret key: {e}")))?;
        Ok(Self { key })
    }

    pub fn keysize(&self) -> usize {
        byte_width(self.key.verifying_key().components().p())
    }

    pub fn p(&self) -> String {
        self.key.verifying_key().components().p().to_str_radix(16)
    }

    pub fn q(&self) -> String {
        self.key.verifying_key().components().q().to_str_radix(16)
    }

    pub fn g(&self) -> String {
        self.key.verifying_key().components().g().to_str_radix(16)
    }

    pub fn x(&self) -> String {
        self.key.x().to_str_radix(16)
    }

    /// Signs `message`, returning r and s as fixed-width concatenated hex.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let q = self.key.verifying_key().components().q();
        let width = byte_width(q);

        let sig: Signature = if sha1_subgroup(q) {
            let mut digest = Sha1::new();
            digest.update(message);
            self.key.try_sign_digest(digest)
        } else {
            let mut digest = Sha256::new();
            digest.update(message);
            self.key.try_sign_digest(digest)
        }
        .map_err(|e| VerifyError::Crypto(format!("DSA signing failed: {e}")))?;

        Ok(format!(
            "{}{}",
            to_padded_hex(sig.r(), width),
            to_padded_hex(sig.s(), width)
        ))
    }

    pub fn public_key(&self) -> DsaPublicKey {
        DsaPublicKey::from_inner(self.key.verifying_key().clone())
    }
}
