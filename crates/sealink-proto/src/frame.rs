//! Fixed-size frame types.
//!
//! Every frame crosses the link as a raw byte sequence with no envelope or
//! header. The receiver knows which frame comes next from its position in
//! the call-and-response sequence, so each type here is nothing more than a
//! length-checked byte array.
//!
//! | Frame | Size | Content |
//! |---|---|---|
//! | [`RawPublicKey`] | 64 B | uncompressed X9.63 point without the `0x04` tag (X ‖ Y) |
//! | [`Challenge`] | 32 B | random nonce |
//! | [`RawSignature`] | 64 B | ECDSA r ‖ s |
//! | [`Iv`] | 12 B | AEAD nonce |
//! | [`AuthTag`] | 16 B | AEAD authentication tag |
//! | [`Ciphertext`] | 1..=127 B | equal to plaintext length |

use std::fmt;

use bytes::Bytes;

use crate::errors::{FrameError, Result};

/// Raw public key size (X ‖ Y, 32 bytes each)
pub const PUBLIC_KEY_SIZE: usize = 64;

/// Handshake challenge size
pub const CHALLENGE_SIZE: usize = 32;

/// Raw ECDSA signature size (r ‖ s)
pub const SIGNATURE_SIZE: usize = 64;

/// AEAD nonce size
pub const IV_SIZE: usize = 12;

/// AEAD tag size
pub const TAG_SIZE: usize = 16;

/// Largest application message carried in one ciphertext frame
pub const MAX_PLAINTEXT_SIZE: usize = 127;

/// Identifies a frame by its position in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Identity public key
    PublicKey,
    /// Freshness challenge
    Challenge,
    /// Detached signature
    Signature,
    /// AEAD nonce
    Iv,
    /// AEAD tag
    Tag,
    /// Encrypted application payload
    Ciphertext,
}

impl FrameKind {
    /// Largest number of bytes this frame may carry.
    ///
    /// For fixed frames this is also the exact size.
    pub const fn max_size(self) -> usize {
        match self {
            Self::PublicKey => PUBLIC_KEY_SIZE,
            Self::Challenge => CHALLENGE_SIZE,
            Self::Signature => SIGNATURE_SIZE,
            Self::Iv => IV_SIZE,
            Self::Tag => TAG_SIZE,
            Self::Ciphertext => MAX_PLAINTEXT_SIZE,
        }
    }

    /// True for every frame except the ciphertext.
    pub const fn is_fixed(self) -> bool {
        !matches!(self, Self::Ciphertext)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PublicKey => "public-key",
            Self::Challenge => "challenge",
            Self::Signature => "signature",
            Self::Iv => "iv",
            Self::Tag => "tag",
            Self::Ciphertext => "ciphertext",
        };
        f.write_str(name)
    }
}

/// A frame whose size never varies.
pub trait FixedFrame: Sized {
    /// Which frame this is
    const KIND: FrameKind;

    /// Exact wire size
    const SIZE: usize;

    /// Wire bytes.
    fn as_bytes(&self) -> &[u8];

    /// Parse wire bytes.
    ///
    /// # Errors
    ///
    /// - `FrameError::LengthMismatch` if `bytes.len() != Self::SIZE`
    fn from_slice(bytes: &[u8]) -> Result<Self>;
}

macro_rules! fixed_frame {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $size:expr) => {
        $(#[$meta])*
        pub struct $name([u8; $size]);

        impl $name {
            /// Wrap an owned byte array.
            pub const fn from_bytes(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Borrow the underlying array.
            pub const fn as_array(&self) -> &[u8; $size] {
                &self.0
            }
        }

        impl FixedFrame for $name {
            const KIND: FrameKind = FrameKind::$kind;
            const SIZE: usize = $size;

            fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            fn from_slice(bytes: &[u8]) -> Result<Self> {
                let array = <[u8; $size]>::try_from(bytes).map_err(|_| {
                    FrameError::LengthMismatch { expected: $size, actual: bytes.len() }
                })?;
                Ok(Self(array))
            }
        }
    };
}

fixed_frame!(
    /// Public key as carried on the wire. Not yet validated against the curve.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    RawPublicKey,
    PublicKey,
    PUBLIC_KEY_SIZE
);

fixed_frame!(
    /// Single-use freshness nonce.
    ///
    /// Deliberately neither `Clone` nor `Copy`: a challenge is generated once
    /// per handshake attempt and consumed by exactly one verification.
    #[derive(Debug, PartialEq, Eq)]
    Challenge,
    Challenge,
    CHALLENGE_SIZE
);

fixed_frame!(
    /// ECDSA signature in raw r ‖ s form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    RawSignature,
    Signature,
    SIGNATURE_SIZE
);

fixed_frame!(
    /// AEAD nonce. Must never repeat under one session key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    Iv,
    Iv,
    IV_SIZE
);

fixed_frame!(
    /// AEAD authentication tag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    AuthTag,
    Tag,
    TAG_SIZE
);

/// Check that an application payload fits in one ciphertext frame.
///
/// # Errors
///
/// - `FrameError::EmptyPayload` if `len == 0`
/// - `FrameError::PayloadTooLarge` if `len > MAX_PLAINTEXT_SIZE`
pub fn check_message_len(len: usize) -> Result<()> {
    if len == 0 {
        return Err(FrameError::EmptyPayload);
    }
    if len > MAX_PLAINTEXT_SIZE {
        return Err(FrameError::PayloadTooLarge { size: len, max: MAX_PLAINTEXT_SIZE });
    }
    Ok(())
}

/// Encrypted application payload.
///
/// # Invariants
///
/// - `1 <= len() <= MAX_PLAINTEXT_SIZE`, enforced by [`Ciphertext::new`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(Bytes);

impl Ciphertext {
    /// Wrap ciphertext bytes after checking the size bounds.
    ///
    /// # Errors
    ///
    /// See [`check_message_len`].
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        check_message_len(bytes.len())?;
        Ok(Self(bytes))
    }

    /// Wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of ciphertext bytes (equal to the plaintext length).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One application message as it crosses the link.
///
/// Sent as four separate frames in the order IV, tag, ciphertext, signature.
/// The signature covers the plaintext, not the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// AEAD nonce
    pub iv: Iv,
    /// AEAD tag
    pub tag: AuthTag,
    /// Encrypted payload
    pub ciphertext: Ciphertext,
    /// Signature over the SHA-256 digest of the plaintext
    pub signature: RawSignature,
}

impl SealedMessage {
    /// Frames in transmission order.
    pub fn frames(&self) -> [(FrameKind, &[u8]); 4] {
        [
            (FrameKind::Iv, self.iv.as_bytes()),
            (FrameKind::Tag, self.tag.as_bytes()),
            (FrameKind::Ciphertext, self.ciphertext.as_bytes()),
            (FrameKind::Signature, self.signature.as_bytes()),
        ]
    }

    /// Total bytes across all four frames.
    pub fn wire_len(&self) -> usize {
        IV_SIZE + TAG_SIZE + self.ciphertext.len() + SIGNATURE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message(len: usize) -> SealedMessage {
        SealedMessage {
            iv: Iv::from_bytes([1; IV_SIZE]),
            tag: AuthTag::from_bytes([2; TAG_SIZE]),
            ciphertext: Ciphertext::new(vec![3u8; len]).unwrap(),
            signature: RawSignature::from_bytes([4; SIGNATURE_SIZE]),
        }
    }

    #[test]
    fn fixed_frame_rejects_wrong_length() {
        let result = RawPublicKey::from_slice(&[0u8; 65]);
        assert_eq!(result, Err(FrameError::LengthMismatch { expected: 64, actual: 65 }));

        let result = Iv::from_slice(&[0u8; 11]);
        assert_eq!(result, Err(FrameError::LengthMismatch { expected: 12, actual: 11 }));
    }

    #[test]
    fn fixed_frame_accepts_exact_length() {
        let tag = AuthTag::from_slice(&[0xAA; TAG_SIZE]).unwrap();
        assert_eq!(tag.as_array(), &[0xAA; TAG_SIZE]);
        assert_eq!(<AuthTag as FixedFrame>::KIND, FrameKind::Tag);
    }

    #[test]
    fn ciphertext_bounds() {
        assert_eq!(Ciphertext::new(Vec::new()), Err(FrameError::EmptyPayload));
        assert!(Ciphertext::new(vec![0u8; MAX_PLAINTEXT_SIZE]).is_ok());
        assert_eq!(
            Ciphertext::new(vec![0u8; MAX_PLAINTEXT_SIZE + 1]),
            Err(FrameError::PayloadTooLarge { size: 128, max: 127 })
        );
    }

    #[test]
    fn sealed_message_frame_order() {
        let message = sample_message(5);
        let kinds: Vec<FrameKind> = message.frames().iter().map(|(kind, _)| *kind).collect();

        assert_eq!(kinds, vec![
            FrameKind::Iv,
            FrameKind::Tag,
            FrameKind::Ciphertext,
            FrameKind::Signature
        ]);
        assert_eq!(message.wire_len(), 12 + 16 + 5 + 64);
    }

    #[test]
    fn frame_kind_sizes() {
        assert!(FrameKind::Signature.is_fixed());
        assert!(!FrameKind::Ciphertext.is_fixed());
        assert_eq!(FrameKind::Ciphertext.max_size(), 127);
        assert_eq!(FrameKind::PublicKey.to_string(), "public-key");
    }
}
