//! Identity-assertion and certificate-chain verification for the BrowserID
//! protocol.
//!
//! A relying party receives an opaque bundle string from a user's browser:
//! one or more certificates (each binding a subject public key to an email
//! under an issuer's authority) followed by a single assertion (an
//! audience-bound proof of possession of the terminal subject key), joined
//! by `~`. [`ChainVerifier`] walks that chain in order, resolving only the
//! root issuer's key externally, and yields the certified email, the
//! responsible issuer, and the validated claims, or a single typed error
//! naming the first link that failed.

/// Assertion builder/verifier
pub mod assertion;

/// Audience normalization and comparison
pub mod audience;

/// Bundle protocol (certificate chain + assertion wire format)
pub mod bundle;

/// Certifying-authority helper
pub mod ca;

/// Certificate builder/verifier
pub mod cert;

/// Chain verification orchestrator and issuer key resolution
pub mod chain;

/// Error taxonomy
pub mod error;

/// Key abstraction and algorithm registry
pub mod keys;

/// Key-pair persistence
pub mod store;

/// Compact token codec
pub mod token;

pub use chain::{ChainVerifier, IssuerKeyResolver, StaticResolver, VerifiedIdentity};
pub use error::{Result, VerifyError};
pub use keys::{generate_key_pair, Algorithm, KeyPair, PublicKey, SecretKey};

/// All protocol timestamps are epoch milliseconds. Expiry comparisons use
/// `now <= exp`: the expiry instant itself is still valid.
pub type EpochMillis = i64;
