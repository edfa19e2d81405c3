//! Authenticated, encrypted messaging over an established session.
//!
//! # Message Flow
//!
//! ```text
//! send(plaintext)
//!   │ 1 <= len <= 127
//!   │ fresh random IV, never seen in this session
//!   │ AES-128-GCM(session key, IV) -> ciphertext, tag
//!   │ secure element signs SHA-256(plaintext)
//!   ▼
//! IV ─▶ tag ─▶ ciphertext ─▶ signature
//!
//! receive()
//!   │ IV, tag, ciphertext, signature
//!   │ IV not seen before in this session
//!   │ AES-128-GCM open (tag must verify)
//!   │ signature over SHA-256(plaintext) must verify under the peer key
//!   ▼
//! plaintext
//! ```
//!
//! Every failure here is per-message: the session stays usable and the
//! caller decides whether to carry on.
//!
//! # IV Tracking
//!
//! Both directions share one session key, so the messenger records every IV
//! it has sent or accepted. A freshly drawn IV that is already in the set is
//! never used (`CryptoError::IvReuse`), and an incoming IV that is already
//! in the set is rejected as a replay.

use std::collections::HashSet;

use sealink_crypto::{CryptoError, SessionKey, aead_decrypt, aead_encrypt, hash, verify_signature};
use sealink_proto::{
    AuthTag, Ciphertext, Iv, MAX_PLAINTEXT_SIZE, RawSignature, SealedMessage, check_message_len,
};
use zeroize::Zeroize;

use crate::{
    env::Environment,
    error::{AuthenticationError, SessionError},
    peer::Peer,
    secure_element::SecureElement,
    session::{EstablishedSession, PeerPublicKey},
    transport::{Transport, receive_fixed},
};

/// Associated data bound into every message tag.
const ASSOCIATED_DATA: &[u8] = &[];

/// Sends and receives protected messages for one session.
///
/// Owns the peer for the lifetime of the session. The session key is
/// zeroized when the messenger is dropped or turned back into a peer.
pub struct SecureMessenger<SE, T, E> {
    peer: Peer<SE, T, E>,
    session_key: SessionKey,
    peer_key: PeerPublicKey,
    seen_ivs: HashSet<Iv>,
    sent: u64,
    received: u64,
}

impl<SE, T, E> SecureMessenger<SE, T, E>
where
    SE: SecureElement,
    T: Transport,
    E: Environment,
{
    pub(crate) fn new(peer: Peer<SE, T, E>, session: EstablishedSession) -> Self {
        let (session_key, peer_key) = session.into_parts();
        Self { peer, session_key, peer_key, seen_ivs: HashSet::new(), sent: 0, received: 0 }
    }

    /// Authenticated identity key of the peer.
    pub fn peer_key(&self) -> &PeerPublicKey {
        &self.peer_key
    }

    /// The underlying peer.
    pub fn peer(&self) -> &Peer<SE, T, E> {
        &self.peer
    }

    /// The underlying peer, mutably.
    pub fn peer_mut(&mut self) -> &mut Peer<SE, T, E> {
        &mut self.peer
    }

    /// Messages sent so far.
    pub fn messages_sent(&self) -> u64 {
        self.sent
    }

    /// Messages accepted so far.
    pub fn messages_received(&self) -> u64 {
        self.received
    }

    /// Encrypt, sign and transmit one message.
    ///
    /// Returns the message as it was put on the link.
    ///
    /// # Errors
    ///
    /// - `Frame` if the plaintext is empty or longer than 127 bytes
    /// - `Crypto(IvReuse)` if the IV source repeats itself
    /// - `Device` if the secure element cannot sign
    /// - `Io` if the link fails
    pub fn send(&mut self, plaintext: &[u8]) -> Result<SealedMessage, SessionError> {
        let message = self.seal(plaintext)?;
        self.transmit(&message)?;
        Ok(message)
    }

    /// Encrypt and sign one message without transmitting it.
    ///
    /// The IV is consumed even if a later step fails.
    ///
    /// # Errors
    ///
    /// See [`SecureMessenger::send`], minus link failures.
    pub fn seal(&mut self, plaintext: &[u8]) -> Result<SealedMessage, SessionError> {
        check_message_len(plaintext.len())?;

        let iv = self.fresh_iv()?;
        let (ciphertext, tag) =
            aead_encrypt(self.session_key.as_bytes(), &iv, plaintext, ASSOCIATED_DATA)?;

        let (element, identity) = self.peer.signer();
        let signature = element.sign(identity.slot(), &hash(plaintext))?;

        Ok(SealedMessage { iv, tag, ciphertext: Ciphertext::new(ciphertext)?, signature })
    }

    /// Put a sealed message on the link, one frame at a time.
    ///
    /// # Errors
    ///
    /// - `Io` if any frame fails to send
    pub fn transmit(&mut self, message: &SealedMessage) -> Result<(), SessionError> {
        let transport = self.peer.transport_mut();
        for (kind, frame) in message.frames() {
            tracing::trace!(%kind, len = frame.len(), "sending frame");
            transport.send(frame)?;
        }

        self.sent += 1;
        tracing::debug!(len = message.ciphertext.len(), sent = self.sent, "message sent");
        Ok(())
    }

    /// Receive, decrypt and authenticate one message.
    ///
    /// # Errors
    ///
    /// - `Io` if a frame times out, is cut short, or the link closes
    /// - `Authentication(Replay)` if the IV was already used in this session
    /// - `Crypto(DecryptionFailed)` if the tag does not verify
    /// - `Authentication(SignatureMismatch)` if the signature does not verify
    pub fn receive(&mut self) -> Result<Vec<u8>, SessionError> {
        let message = {
            let transport = self.peer.transport_mut();
            let iv: Iv = receive_fixed(&mut *transport)?;
            let tag: AuthTag = receive_fixed(&mut *transport)?;
            let ciphertext = Ciphertext::new(transport.receive_frame(MAX_PLAINTEXT_SIZE)?)?;
            let signature: RawSignature = receive_fixed(&mut *transport)?;
            SealedMessage { iv, tag, ciphertext, signature }
        };

        self.open(&message)
    }

    /// Decrypt and authenticate a message that has already been read off
    /// the link.
    ///
    /// # Errors
    ///
    /// See [`SecureMessenger::receive`], minus link failures.
    pub fn open(&mut self, message: &SealedMessage) -> Result<Vec<u8>, SessionError> {
        if self.seen_ivs.contains(&message.iv) {
            tracing::warn!("rejecting message with previously used IV");
            return Err(AuthenticationError::Replay.into());
        }

        let mut plaintext = aead_decrypt(
            self.session_key.as_bytes(),
            &message.iv,
            message.ciphertext.as_bytes(),
            &message.tag,
            ASSOCIATED_DATA,
        )?;

        if !verify_signature(self.peer_key.as_raw(), &hash(&plaintext), &message.signature) {
            plaintext.zeroize();
            return Err(AuthenticationError::SignatureMismatch.into());
        }

        self.seen_ivs.insert(message.iv);
        self.received += 1;
        tracing::debug!(len = plaintext.len(), received = self.received, "message accepted");
        Ok(plaintext)
    }

    /// End the session and recover the peer, e.g. to re-key with a new
    /// handshake. The session key is zeroized.
    pub fn into_peer(self) -> Peer<SE, T, E> {
        let Self { mut peer, .. } = self;
        peer.reset();
        peer
    }

    fn fresh_iv(&mut self) -> Result<Iv, CryptoError> {
        let iv = Iv::from_bytes(self.peer.env().random_array());

        if !self.seen_ivs.insert(iv) {
            tracing::error!("IV source repeated a value; refusing to encrypt");
            return Err(CryptoError::IvReuse);
        }
        Ok(iv)
    }
}
