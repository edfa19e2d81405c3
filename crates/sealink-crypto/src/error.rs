//! Error types for symmetric and verification primitives

use thiserror::Error;

/// Errors from cryptographic primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has the wrong length for the cipher
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key length
        expected: usize,
        /// Supplied key length
        actual: usize,
    },

    /// AEAD encryption failed
    #[error("encryption failed")]
    EncryptionFailed,

    /// Authentication tag did not verify
    #[error("decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    /// Public key bytes do not encode a point on the curve
    #[error("public key is not a valid curve point")]
    InvalidPublicKey,

    /// The RNG produced an IV already used under the current key
    #[error("IV already used under this session key")]
    IvReuse,
}
