//! Message encryption using AES-128-GCM with a detached tag
//!
//! The tag travels in its own frame, so encryption returns ciphertext and tag
//! separately and decryption takes them separately. Ciphertext length always
//! equals plaintext length.
//!
//! All functions are pure - the IV must be provided by the caller.

use aes_gcm::{
    Aes128Gcm, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use sealink_proto::{AuthTag, FixedFrame, Iv, TAG_SIZE};

use crate::error::CryptoError;

/// AES-128 key size
pub const AEAD_KEY_SIZE: usize = 16;

fn cipher(key: &[u8]) -> Result<Aes128Gcm, CryptoError> {
    Aes128Gcm::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidKeyLength { expected: AEAD_KEY_SIZE, actual: key.len() })
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// Returns `(ciphertext, tag)`.
///
/// # Security
///
/// - The caller MUST NOT reuse an IV under the same key
///
/// # Errors
///
/// - `InvalidKeyLength` if `key` is not 16 bytes
/// - `EncryptionFailed` if the cipher rejects the input
pub fn aead_encrypt(
    key: &[u8],
    iv: &Iv,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<(Vec<u8>, AuthTag), CryptoError> {
    let cipher = cipher(key)?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(iv.as_bytes()), associated_data, &mut buffer)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok((buffer, AuthTag::from_bytes(tag_bytes)))
}

/// Decrypt and authenticate `ciphertext`.
///
/// Returns the plaintext only if the tag verifies; no partial output is ever
/// released.
///
/// # Errors
///
/// - `InvalidKeyLength` if `key` is not 16 bytes
/// - `DecryptionFailed` if the tag does not verify (tamper or wrong key)
pub fn aead_decrypt(
    key: &[u8],
    iv: &Iv,
    ciphertext: &[u8],
    tag: &AuthTag,
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher(key)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(iv.as_bytes()),
            associated_data,
            &mut buffer,
            Tag::from_slice(tag.as_bytes()),
        )
        .map_err(|_| CryptoError::DecryptionFailed)?;

    Ok(buffer)
}
