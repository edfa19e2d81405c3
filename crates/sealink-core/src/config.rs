//! Protocol configuration.

use std::{fmt, time::Duration};

use crate::secure_element::KeySlot;

/// Default per-frame link timeout.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default number of handshake attempts before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Default wait between handshake attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Slot holding this peer's long-term identity key.
pub const IDENTITY_SLOT: KeySlot = KeySlot(0);

/// Slot reserved for the peer's public key on devices that store it.
pub const PEER_KEY_SLOT: KeySlot = KeySlot(1);

/// Which side of the handshake a peer plays.
///
/// The two roles run mirrored step sequences so that exactly one side is
/// waiting whenever the other is sending. Two peers with the same role
/// would both block on their first receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends first
    Initiator,
    /// Receives first
    Responder,
}

impl Role {
    /// The role the other side must play.
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// Handshake and link parameters for one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Which side of the handshake this peer plays
    pub role: Role,

    /// Secure element slot holding the identity key
    pub identity_slot: KeySlot,

    /// Secure element slot reserved for the peer's public key
    pub peer_key_slot: KeySlot,

    /// Per-frame link timeout, applied by the transport
    pub io_timeout: Duration,

    /// Handshake attempts before reporting `RetriesExhausted`
    pub max_attempts: u32,

    /// Wait between consecutive attempts (not after the last one)
    pub retry_backoff: Duration,
}

impl ProtocolConfig {
    /// Defaults for the given role.
    pub fn for_role(role: Role) -> Self {
        Self { role, ..Self::default() }
    }

    /// Check that the configuration can drive a handshake.
    ///
    /// # Errors
    ///
    /// Returns a short reason when `max_attempts` is zero or the identity
    /// key would share a slot with the reserved peer-key slot.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        if self.identity_slot == self.peer_key_slot {
            return Err("identity slot overlaps the reserved peer-key slot");
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            role: Role::Initiator,
            identity_slot: IDENTITY_SLOT,
            peer_key_slot: PEER_KEY_SLOT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_attempts: MAX_RETRIES,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}
