//! Sealink wire protocol
//!
//! Frame definitions for the Sealink mutual-authentication protocol. Two
//! peers exchange identity keys, challenges and signatures during the
//! handshake, then carry application messages as IV, tag, ciphertext and
//! signature frames.
//!
//! # Framing
//!
//! There is no envelope, header or length field at this layer. Frame
//! boundaries are implied by the call-and-response order of the protocol;
//! a link that cannot preserve boundaries (a byte stream) must add its own
//! link-level delimiting.
//!
//! ```text
//! Handshake (initiator view)
//!   -> RawPublicKey    64
//!   <- RawPublicKey    64
//!   -> Challenge       32
//!   <- RawSignature    64   over SHA-256(our challenge)
//!   <- Challenge       32
//!   -> RawSignature    64   over SHA-256(peer challenge)
//!
//! Message
//!   -> Iv              12
//!   -> AuthTag         16
//!   -> Ciphertext      1..=127
//!   -> RawSignature    64   over SHA-256(plaintext)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod frame;

pub use errors::{FrameError, Result};
pub use frame::{
    AuthTag, CHALLENGE_SIZE, Challenge, Ciphertext, FixedFrame, FrameKind, IV_SIZE, Iv,
    MAX_PLAINTEXT_SIZE, PUBLIC_KEY_SIZE, RawPublicKey, RawSignature, SIGNATURE_SIZE,
    SealedMessage, TAG_SIZE, check_message_len,
};
