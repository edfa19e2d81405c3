//! Software secure element.
//!
//! Keeps P-256 keys in process memory behind the [`SecureElement`] trait.
//! Used by the simulation harness and by nodes running without hardware.
//! It reproduces the device behaviours the protocol has to cope with: an
//! unreachable bus, locked slots, and empty slots.

use p256::{
    PublicKey,
    ecdh::diffie_hellman,
    ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner},
};
use sealink_crypto::{
    Digest, SHARED_SECRET_SIZE, SharedSecret, decode_public_key, encode_public_key,
};
use sealink_proto::{FixedFrame, RawPublicKey, RawSignature};
use zeroize::Zeroize;

use super::{KeySlot, SecureElement, SecureElementConfig};
use crate::{env::Environment, error::DeviceError};

/// Random draws per key generation before giving up.
///
/// A uniformly random 32-byte string is a valid P-256 scalar with
/// probability above 1 - 2^-32, so more than one retry points at a broken
/// entropy source.
const MAX_KEYGEN_DRAWS: usize = 4;

/// In-memory secure element.
pub struct SoftSecureElement<E> {
    env: E,
    slots: Vec<Option<SigningKey>>,
    locked: Vec<KeySlot>,
    online: bool,
    commands: u64,
}

impl<E: Environment> SoftSecureElement<E> {
    /// Initialize the device with the given slot layout.
    ///
    /// All slots start empty. Key material is drawn from `env`.
    ///
    /// # Errors
    ///
    /// - `CommandFailed` if `slot_count` is zero
    /// - `InvalidSlot` if a locked slot lies outside the slot table
    pub fn init(config: SecureElementConfig, env: E) -> Result<Self, DeviceError> {
        let SecureElementConfig { slot_count, locked_slots } = config;

        if slot_count == 0 {
            return Err(DeviceError::CommandFailed("device reports no key slots".to_string()));
        }
        if let Some(&slot) = locked_slots.iter().find(|slot| slot.0 >= slot_count) {
            return Err(DeviceError::InvalidSlot { slot, slot_count });
        }

        Ok(Self {
            env,
            slots: (0..slot_count).map(|_| None).collect(),
            locked: locked_slots,
            online: true,
            commands: 0,
        })
    }

    /// Simulate the device dropping off (or returning to) the bus.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Commands the device has accepted since `init`.
    pub fn command_count(&self) -> u64 {
        self.commands
    }

    /// Read back the public key stored in `slot`.
    ///
    /// # Errors
    ///
    /// - `InvalidSlot` or `EmptySlot` if the slot holds no key
    pub fn public_key(&self, slot: KeySlot) -> Result<RawPublicKey, DeviceError> {
        let key = self.key(slot)?;
        Ok(encode_public_key(&PublicKey::from(key.verifying_key())))
    }

    fn begin(&mut self) -> Result<(), DeviceError> {
        if !self.online {
            return Err(DeviceError::Unreachable);
        }
        self.commands += 1;
        Ok(())
    }

    fn slot_index(&self, slot: KeySlot) -> Result<usize, DeviceError> {
        let index = usize::from(slot.0);
        if index >= self.slots.len() {
            return Err(DeviceError::InvalidSlot { slot, slot_count: self.slots.len() as u8 });
        }
        Ok(index)
    }

    fn key(&self, slot: KeySlot) -> Result<&SigningKey, DeviceError> {
        let index = self.slot_index(slot)?;
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(DeviceError::EmptySlot { slot })
    }
}

impl<E: Environment> SecureElement for SoftSecureElement<E> {
    fn generate_keypair(&mut self, slot: KeySlot) -> Result<RawPublicKey, DeviceError> {
        self.begin()?;
        let index = self.slot_index(slot)?;
        if self.locked.contains(&slot) {
            return Err(DeviceError::SlotLocked { slot });
        }

        for _ in 0..MAX_KEYGEN_DRAWS {
            let mut scalar: [u8; 32] = self.env.random_array();
            let candidate = SigningKey::from_slice(&scalar);
            scalar.zeroize();

            let Ok(key) = candidate else {
                continue;
            };
            let public_key = encode_public_key(&PublicKey::from(key.verifying_key()));
            if let Some(entry) = self.slots.get_mut(index) {
                *entry = Some(key);
            }
            return Ok(public_key);
        }

        Err(DeviceError::CommandFailed("entropy source produced no valid scalar".to_string()))
    }

    fn ecdh(
        &mut self,
        slot: KeySlot,
        peer_public_key: &RawPublicKey,
    ) -> Result<SharedSecret, DeviceError> {
        self.begin()?;
        let peer = decode_public_key(peer_public_key).map_err(|_| DeviceError::MalformedPeerKey)?;
        let key = self.key(slot)?;

        let shared = diffie_hellman(key.as_nonzero_scalar(), peer.as_affine());
        let mut bytes = [0u8; SHARED_SECRET_SIZE];
        bytes.copy_from_slice(shared.raw_secret_bytes());
        let secret = SharedSecret::from_bytes(bytes);
        bytes.zeroize();

        Ok(secret)
    }

    fn sign(&mut self, slot: KeySlot, digest: &Digest) -> Result<RawSignature, DeviceError> {
        self.begin()?;
        let key = self.key(slot)?;

        let signature: Signature =
            key.sign_prehash(digest).map_err(|e| DeviceError::CommandFailed(e.to_string()))?;

        RawSignature::from_slice(&signature.to_bytes())
            .map_err(|e| DeviceError::CommandFailed(e.to_string()))
    }
}
