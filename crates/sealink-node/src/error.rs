//! Node-level errors.
//!
//! Wraps the protocol errors from `sealink-core` together with the OS
//! failures only a real node can hit (binding, connecting, console I/O).

use sealink_core::{DeviceError, HandshakeError, SessionError};
use thiserror::Error;

/// Errors that end a node run.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Socket or console I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Secure element could not provision the identity key
    #[error("provisioning failed: {0}")]
    Device(#[from] DeviceError),

    /// No session could be established
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// Established session broke down
    #[error("session failed: {0}")]
    Session(#[from] SessionError),
}
