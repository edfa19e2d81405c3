//! Outputs of a successful handshake.

use sealink_crypto::{SessionKey, decode_public_key};
use sealink_proto::RawPublicKey;

use crate::error::AuthenticationError;

/// Peer identity key that has passed curve-point validation.
///
/// Only constructed through [`PeerPublicKey::validate`], so holding one
/// proves the bytes describe a point on P-256. It does not prove the peer
/// owns the matching private key; that takes a verified challenge
/// signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerPublicKey(RawPublicKey);

impl PeerPublicKey {
    /// Validate a received public key.
    ///
    /// # Errors
    ///
    /// - `InvalidPeerKey` if the bytes are not a point on P-256
    pub fn validate(raw: RawPublicKey) -> Result<Self, AuthenticationError> {
        decode_public_key(&raw).map_err(|_| AuthenticationError::InvalidPeerKey)?;
        Ok(Self(raw))
    }

    /// Raw X ‖ Y bytes.
    pub fn as_raw(&self) -> &RawPublicKey {
        &self.0
    }
}

/// Mutually authenticated session.
///
/// Both peers of one handshake hold equal session keys.
#[derive(Debug)]
pub struct EstablishedSession {
    session_key: SessionKey,
    peer_key: PeerPublicKey,
}

impl EstablishedSession {
    pub(crate) fn new(session_key: SessionKey, peer_key: PeerPublicKey) -> Self {
        Self { session_key, peer_key }
    }

    /// Session key shared with the peer.
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Authenticated identity key of the peer.
    pub fn peer_key(&self) -> &PeerPublicKey {
        &self.peer_key
    }

    pub(crate) fn into_parts(self) -> (SessionKey, PeerPublicKey) {
        (self.session_key, self.peer_key)
    }
}
