//! Error types for the Sealink protocol core.
//!
//! One enum per layer, so a failure always says where it came from:
//!
//! - [`DeviceError`]: the secure element refused or could not be reached
//! - [`IoError`]: the link timed out, delivered the wrong amount, or closed
//! - [`AuthenticationError`]: the peer failed to prove who it is
//! - [`SessionError`]: umbrella for everything that can end one handshake
//!   attempt or one message
//! - [`HandshakeError`]: what the bounded retry loop reports once it gives up
//!
//! We avoid `std::io::Error` in protocol logic so that callers can match on
//! the precise failure and decide whether it is worth retrying.

use sealink_crypto::CryptoError;
use sealink_proto::FrameError;
use thiserror::Error;

use crate::{handshake::HandshakeState, secure_element::KeySlot};

/// Failures reported by the secure element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Device did not respond
    #[error("secure element unreachable")]
    Unreachable,

    /// Slot number outside the device's slot table
    #[error("invalid key slot {slot} (device has {slot_count} slots)")]
    InvalidSlot {
        /// Requested slot
        slot: KeySlot,
        /// Number of slots the device exposes
        slot_count: u8,
    },

    /// Slot configuration forbids the operation
    #[error("key slot {slot} is locked")]
    SlotLocked {
        /// Locked slot
        slot: KeySlot,
    },

    /// Private-key operation on a slot that holds no key
    #[error("key slot {slot} holds no key")]
    EmptySlot {
        /// Empty slot
        slot: KeySlot,
    },

    /// Peer public key was rejected by the device
    #[error("peer public key is not a valid P-256 point")]
    MalformedPeerKey,

    /// Device accepted the command but reported an execution failure
    #[error("secure element command failed: {0}")]
    CommandFailed(String),
}

/// Link-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// No frame arrived within the configured timeout
    #[error("timed out waiting for frame")]
    Timeout,

    /// Fewer bytes arrived than the frame requires
    #[error("short transfer: expected {expected} bytes, received {received}")]
    ShortTransfer {
        /// Bytes the protocol expected
        expected: usize,
        /// Bytes that actually arrived
        received: usize,
    },

    /// More bytes arrived than the frame allows
    #[error("overrun: expected at most {expected} bytes, received {received}")]
    Overrun {
        /// Largest acceptable frame
        expected: usize,
        /// Bytes that actually arrived
        received: usize,
    },

    /// Peer closed the link
    #[error("link closed by peer")]
    Closed,

    /// Any other link failure
    #[error("link error: {0}")]
    Link(String),
}

/// The peer failed to prove possession of its identity key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Received public key is not a point on P-256
    #[error("peer public key is not a valid P-256 point")]
    InvalidPeerKey,

    /// Signature does not verify under the peer's public key
    #[error("signature does not verify under the peer's public key")]
    SignatureMismatch,

    /// Message reuses an IV already seen in this session
    #[error("message IV already used in this session")]
    Replay,
}

/// Everything that can end one handshake attempt or one message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Secure element failure
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Link failure
    #[error(transparent)]
    Io(#[from] IoError),

    /// Symmetric crypto failure (tag mismatch, IV reuse)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Peer authentication failure
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// Frame or payload size violation
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Step executed without the data an earlier step should have produced
    #[error("cannot {operation} in state {state}")]
    InvalidState {
        /// State the machine was in
        state: HandshakeState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

impl SessionError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Timeouts, partial transfers and an unresponsive device are typical
    /// of a flaky link or bus. A forged signature, a bad tag or a reused IV
    /// is never transient: retrying the same input gives the same answer.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(IoError::Timeout | IoError::ShortTransfer { .. } | IoError::Overrun { .. })
                | Self::Device(DeviceError::Unreachable)
        )
    }

    /// Returns true if the link is gone and no further frames can flow.
    pub fn is_link_closed(&self) -> bool {
        matches!(self, Self::Io(IoError::Closed))
    }
}

/// One failed handshake attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handshake attempt failed in {state}: {source}")]
pub struct AttemptError {
    /// State whose step failed
    pub state: HandshakeState,
    /// What went wrong
    pub source: SessionError,
}

/// Terminal handshake failures reported by the retry loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Every attempt failed
    #[error("handshake failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last: AttemptError,
    },

    /// Retry policy cannot make a single attempt
    #[error("invalid handshake configuration: {reason}")]
    InvalidConfig {
        /// What is wrong
        reason: &'static str,
    },
}
