//! P-256 public key handling and ECDSA verification
//!
//! Keys cross the wire as 64 raw bytes (X ‖ Y). Every decode goes through
//! SEC1 point validation, so a key that is not on the curve never reaches
//! ECDH or verification.

use p256::{
    PublicKey,
    ecdsa::{Signature, VerifyingKey, signature::hazmat::PrehashVerifier},
    elliptic_curve::sec1::ToEncodedPoint,
};
use sealink_proto::{FixedFrame, PUBLIC_KEY_SIZE, RawPublicKey, RawSignature};

use crate::{error::CryptoError, hash::Digest};

/// SEC1 tag byte for an uncompressed point
const SEC1_UNCOMPRESSED: u8 = 0x04;

/// Decode and validate a raw public key.
///
/// # Errors
///
/// - `InvalidPublicKey` if the coordinates are not a point on P-256 (or
///   encode the identity)
pub fn decode_public_key(raw: &RawPublicKey) -> Result<PublicKey, CryptoError> {
    let mut sec1 = [0u8; PUBLIC_KEY_SIZE + 1];
    sec1[0] = SEC1_UNCOMPRESSED;
    sec1[1..].copy_from_slice(raw.as_bytes());

    PublicKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Encode a public key in raw X ‖ Y form.
pub fn encode_public_key(key: &PublicKey) -> RawPublicKey {
    let point = key.to_encoded_point(false);

    // INVARIANT: the uncompressed encoding of a non-identity point is
    // 0x04 ‖ X ‖ Y (65 bytes), and `PublicKey` cannot hold the identity.
    let mut raw = [0u8; PUBLIC_KEY_SIZE];
    raw.copy_from_slice(&point.as_bytes()[1..]);

    RawPublicKey::from_bytes(raw)
}

/// Verify an ECDSA signature over a precomputed digest.
///
/// Fails closed: a key that does not decode, or a signature whose scalars
/// are out of range, is reported exactly like a signature that does not
/// verify.
pub fn verify_signature(public_key: &RawPublicKey, digest: &Digest, signature: &RawSignature) -> bool {
    let Ok(key) = decode_public_key(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature.as_bytes()) else {
        return false;
    };

    VerifyingKey::from(&key).verify_prehash(digest, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use p256::ecdsa::{SigningKey, signature::hazmat::PrehashSigner};

    use super::*;
    use crate::hash::hash;

    fn test_signing_key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn raw_public(key: &SigningKey) -> RawPublicKey {
        encode_public_key(&PublicKey::from(key.verifying_key()))
    }

    fn raw_sign(key: &SigningKey, digest: &Digest) -> RawSignature {
        let signature: Signature = key.sign_prehash(digest).unwrap();
        RawSignature::from_slice(&signature.to_bytes()).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let key = test_signing_key(3);
        let raw = raw_public(&key);
        let decoded = decode_public_key(&raw).unwrap();

        assert_eq!(decoded, PublicKey::from(key.verifying_key()));
    }

    #[test]
    fn off_curve_key_is_rejected() {
        let mut bytes = *raw_public(&test_signing_key(3)).as_array();
        bytes[63] ^= 0x01;

        let result = decode_public_key(&RawPublicKey::from_bytes(bytes));
        assert_eq!(result, Err(CryptoError::InvalidPublicKey));
    }

    #[test]
    fn valid_signature_verifies() {
        let key = test_signing_key(9);
        let digest = hash(b"challenge");

        assert!(verify_signature(&raw_public(&key), &digest, &raw_sign(&key, &digest)));
    }

    #[test]
    fn signature_over_other_digest_fails() {
        let key = test_signing_key(9);
        let signature = raw_sign(&key, &hash(b"stale challenge"));

        assert!(!verify_signature(&raw_public(&key), &hash(b"fresh challenge"), &signature));
    }

    #[test]
    fn signature_by_other_key_fails() {
        let signer = test_signing_key(1);
        let other = test_signing_key(2);
        let digest = hash(b"msg");

        assert!(!verify_signature(&raw_public(&other), &digest, &raw_sign(&signer, &digest)));
    }

    #[test]
    fn invalid_key_fails_closed() {
        let key = test_signing_key(5);
        let digest = hash(b"msg");
        let signature = raw_sign(&key, &digest);

        let garbage = RawPublicKey::from_bytes([0xFF; PUBLIC_KEY_SIZE]);
        assert!(!verify_signature(&garbage, &digest, &signature));
    }

    #[test]
    fn zero_signature_fails_closed() {
        let key = test_signing_key(5);
        let zero = RawSignature::from_bytes([0; 64]);

        assert!(!verify_signature(&raw_public(&key), &hash(b"msg"), &zero));
    }
}
