//! SHA-256 hashing

use sha2::{Digest as _, Sha256};

/// SHA-256 output size
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 digest.
pub type Digest = [u8; DIGEST_SIZE];

/// Hash `data` with SHA-256.
pub fn hash(data: &[u8]) -> Digest {
    Sha256::digest(data).into()
}
