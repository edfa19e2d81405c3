//! Secure element command interface.
//!
//! The secure element is the only place a private key ever exists. The
//! protocol asks it for three things: generate a key pair in a slot, run
//! ECDH against a peer key, and sign a digest. Hardware drivers and the
//! in-memory [`SoftSecureElement`] implement the same trait, so the
//! handshake and messenger never know which one they talk to.

mod soft;

use std::fmt;

use sealink_crypto::{Digest, SharedSecret};
use sealink_proto::{RawPublicKey, RawSignature};
pub use soft::SoftSecureElement;

use crate::error::DeviceError;

/// Default number of key slots, matching common ECC secure elements.
pub const DEFAULT_SLOT_COUNT: u8 = 16;

/// Index of a non-volatile key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeySlot(pub u8);

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device-level configuration passed to `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureElementConfig {
    /// Number of key slots the device exposes
    pub slot_count: u8,

    /// Slots whose configuration forbids key generation
    pub locked_slots: Vec<KeySlot>,
}

impl Default for SecureElementConfig {
    fn default() -> Self {
        Self { slot_count: DEFAULT_SLOT_COUNT, locked_slots: Vec::new() }
    }
}

/// Commands the protocol issues to the secure element.
///
/// # Invariants
///
/// - Private keys never cross this interface
/// - `ecdh(a, pub_b)` on one device equals `ecdh(b, pub_a)` on the other
/// - `sign` accepts a precomputed SHA-256 digest, never a raw message
pub trait SecureElement {
    /// Generate (or regenerate) a key pair in `slot` and return the public
    /// half.
    ///
    /// # Errors
    ///
    /// - `Unreachable` if the device does not respond
    /// - `InvalidSlot` or `SlotLocked` if the slot cannot hold a new key
    fn generate_keypair(&mut self, slot: KeySlot) -> Result<RawPublicKey, DeviceError>;

    /// ECDH between the private key in `slot` and `peer_public_key`.
    ///
    /// # Errors
    ///
    /// - `MalformedPeerKey` if the peer key is not a curve point
    /// - `EmptySlot` if `slot` holds no key
    /// - `Unreachable` on communication failure
    fn ecdh(
        &mut self,
        slot: KeySlot,
        peer_public_key: &RawPublicKey,
    ) -> Result<SharedSecret, DeviceError>;

    /// Sign `digest` with the private key in `slot`.
    ///
    /// # Errors
    ///
    /// - `EmptySlot` if `slot` holds no key
    /// - `Unreachable` on communication failure
    fn sign(&mut self, slot: KeySlot, digest: &Digest) -> Result<RawSignature, DeviceError>;
}

impl<T: SecureElement + ?Sized> SecureElement for &mut T {
    fn generate_keypair(&mut self, slot: KeySlot) -> Result<RawPublicKey, DeviceError> {
        (**self).generate_keypair(slot)
    }

    fn ecdh(
        &mut self,
        slot: KeySlot,
        peer_public_key: &RawPublicKey,
    ) -> Result<SharedSecret, DeviceError> {
        (**self).ecdh(slot, peer_public_key)
    }

    fn sign(&mut self, slot: KeySlot, digest: &Digest) -> Result<RawSignature, DeviceError> {
        (**self).sign(slot, digest)
    }
}

/// Identity key held by the secure element.
///
/// Caches the public half so the handshake can send it without another
/// device round-trip. Created once at startup and never regenerated while a
/// session is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairHandle {
    slot: KeySlot,
    public_key: RawPublicKey,
}

impl KeyPairHandle {
    /// Generate a fresh identity key in `slot`.
    ///
    /// # Errors
    ///
    /// Propagates the device's `generate_keypair` failure.
    pub fn generate<SE: SecureElement + ?Sized>(
        element: &mut SE,
        slot: KeySlot,
    ) -> Result<Self, DeviceError> {
        let public_key = element.generate_keypair(slot)?;
        Ok(Self { slot, public_key })
    }

    /// Slot holding the private key.
    pub fn slot(&self) -> KeySlot {
        self.slot
    }

    /// Cached public key.
    pub fn public_key(&self) -> &RawPublicKey {
        &self.public_key
    }
}
