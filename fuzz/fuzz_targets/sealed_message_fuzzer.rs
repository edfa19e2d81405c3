//! Fuzz target for opening attacker-controlled messages
//!
//! Everything a receiver processes before it trusts a message comes from
//! the wire: the peer's public key during the handshake, then IV, tag,
//! ciphertext and signature for each message.
//!
//! # Invariants
//!
//! - Public key decoding, AEAD decryption and signature verification MUST
//!   NOT panic on arbitrary input
//! - A forged tag never decrypts under a key the forger does not know
//! - An off-curve public key never verifies a signature

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealink_crypto::{aead_decrypt, aead_encrypt, decode_public_key, hash, verify_signature};
use sealink_proto::{AuthTag, Ciphertext, FixedFrame, Iv, RawPublicKey, RawSignature};

#[derive(Debug, Arbitrary)]
struct WireMessage {
    key: [u8; 16],
    iv: [u8; 12],
    tag: [u8; 16],
    ciphertext: Vec<u8>,
    public_key: [u8; 64],
    signature: [u8; 64],
    plaintext: Vec<u8>,
}

fuzz_target!(|msg: WireMessage| {
    let iv = Iv::from_bytes(msg.iv);
    let tag = AuthTag::from_bytes(msg.tag);

    // Length validation only; contents are opaque
    let _ = Ciphertext::new(msg.ciphertext.clone());
    let _ = aead_decrypt(&msg.key, &iv, &msg.ciphertext, &tag, &[]);

    // A tag that differs from the real one must not authenticate
    if let Ok((ciphertext, real_tag)) = aead_encrypt(&msg.key, &iv, &msg.plaintext, &[]) {
        if real_tag != tag {
            assert!(aead_decrypt(&msg.key, &iv, &ciphertext, &tag, &[]).is_err());
        }
    }

    let public_key = RawPublicKey::from_bytes(msg.public_key);
    let signature = RawSignature::from_bytes(msg.signature);
    let verified = verify_signature(&public_key, &hash(&msg.plaintext), &signature);
    if decode_public_key(&public_key).is_err() {
        assert!(!verified, "signature verified under an invalid public key");
    }
});
