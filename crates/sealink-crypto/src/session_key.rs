//! Session key derivation from the ECDH shared secret
//!
//! ```text
//! ECDH(own slot, peer public key)
//!        │
//!        ▼
//! SharedSecret (32 bytes, never transmitted)
//!        │
//!        ▼ SHA-256, truncate
//! SessionKey (16 bytes, AES-128)
//! ```
//!
//! Both types zeroize their contents on drop.

use std::fmt;

use zeroize::Zeroize;

use crate::{aead::AEAD_KEY_SIZE, hash::hash};

/// Raw ECDH output size
pub const SHARED_SECRET_SIZE: usize = 32;

/// Session key size
pub const SESSION_KEY_SIZE: usize = AEAD_KEY_SIZE;

/// Raw ECDH shared secret.
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    /// Wrap the raw x-coordinate produced by ECDH.
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Symmetric key for message encryption.
///
/// Lives only in volatile memory, exists only after the peer has been
/// authenticated, and is owned by exactly one messenger.
#[derive(PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    /// Key bytes for the AEAD.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Derive the session key: the first 16 bytes of SHA-256(shared secret).
///
/// Deterministic: the same shared secret always yields the same key.
pub fn derive_session_key(shared_secret: &SharedSecret) -> SessionKey {
    let mut digest = hash(shared_secret.as_bytes());

    let mut key = [0u8; SESSION_KEY_SIZE];
    key.copy_from_slice(&digest[..SESSION_KEY_SIZE]);
    digest.zeroize();

    SessionKey(key)
}
