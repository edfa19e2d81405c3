//! Sealink Cryptographic Primitives
//!
//! The software half of the Sealink crypto stack: hashing, authenticated
//! encryption and signature verification. Everything that needs a private
//! key (key generation, ECDH, signing) lives in the secure element instead
//! and never passes through this crate.
//!
//! Pure functions with deterministic outputs. Callers provide IVs so tests
//! can drive the primitives with fixed inputs.
//!
//! # Key Lifecycle
//!
//! ```text
//! Secure element ECDH
//!        │
//!        ▼
//! SharedSecret ── SHA-256, first 16 bytes ──▶ SessionKey
//!        │
//!        ▼
//! AES-128-GCM (fresh 12-byte IV per message) → Ciphertext + Tag
//! ```
//!
//! # Security
//!
//! Authenticity:
//! - AES-GCM tag proves integrity under the session key
//! - Detached ECDSA signature proves authorship by the long-term identity key
//! - Failed tag or signature -> reject message
//!
//! Fail closed:
//! - Public keys are validated as curve points on every decode
//! - Verification treats malformed keys and signatures as a plain mismatch

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod error;
pub mod hash;
pub mod session_key;
pub mod signature;

pub use aead::{AEAD_KEY_SIZE, aead_decrypt, aead_encrypt};
pub use error::CryptoError;
pub use hash::{DIGEST_SIZE, Digest, hash};
pub use session_key::{
    SESSION_KEY_SIZE, SHARED_SECRET_SIZE, SessionKey, SharedSecret, derive_session_key,
};
pub use signature::{decode_public_key, encode_public_key, verify_signature};
