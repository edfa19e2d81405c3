//! Sealink protocol core
//!
//! Mutual authentication and encrypted messaging between two peers whose
//! identity keys live in secure elements. This crate holds the protocol
//! logic; I/O and entropy come in through traits so that the same code runs
//! against hardware, TCP and the deterministic simulation harness.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Peer                                               │
//! │   provision ── handshake (bounded retries) ─┐      │
//! │                                             ▼      │
//! │                               SecureMessenger      │
//! │                               send / receive       │
//! └────┬───────────────────┬──────────────────┬────────┘
//!      │                   │                  │
//!  SecureElement       Transport         Environment
//!  (keys, ECDH, sign)  (frames, timeout) (clock, RNG, sleep)
//! ```
//!
//! # Security Invariants
//!
//! - Private keys never leave the secure element
//! - No session key exists before the peer's challenge signature verifies.
//!   Completion can be one-sided: the initiator cannot observe the
//!   responder rejecting its final signature (see [`handshake`])
//! - No IV repeats under one session key
//! - A received message is released only after both its tag and its
//!   signature verify

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod handshake;
pub mod messenger;
pub mod peer;
pub mod secure_element;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{
    DEFAULT_IO_TIMEOUT, IDENTITY_SLOT, MAX_RETRIES, PEER_KEY_SLOT, ProtocolConfig, RETRY_BACKOFF,
    Role,
};
pub use env::Environment;
pub use error::{
    AttemptError, AuthenticationError, DeviceError, HandshakeError, IoError, SessionError,
};
pub use handshake::HandshakeState;
pub use messenger::SecureMessenger;
pub use peer::Peer;
pub use secure_element::{
    KeyPairHandle, KeySlot, SecureElement, SecureElementConfig, SoftSecureElement,
};
pub use session::{EstablishedSession, PeerPublicKey};
pub use transport::{StreamTransport, Transport, receive_fixed, send_fixed};
