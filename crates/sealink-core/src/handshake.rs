//! Mutual-authentication handshake.
//!
//! Each side proves possession of its identity key by signing the other
//! side's fresh challenge, then both derive the session key from ECDH.
//! The two roles run mirrored step sequences, so a send on one side always
//! lines up with a receive on the other:
//!
//! ```text
//!        Initiator                              Responder
//! SendOwnPublicKey            ── pk ──▶   AwaitPeerPublicKey
//! AwaitPeerPublicKey          ◀── pk ──   SendOwnPublicKey
//! SendChallenge               ── c_I ─▶   AwaitPeerChallenge
//! AwaitPeerSignatureAndVerify ◀─ sig ──   SignAndSendResponse     sig = Sign(H(c_I))
//! AwaitPeerChallenge          ◀── c_R ─   SendChallenge
//! SignAndSendResponse         ── sig ─▶   AwaitPeerSignatureAndVerify
//! DeriveSessionKey                        DeriveSessionKey        K = H(ECDH)[..16]
//! Complete                                Complete
//! ```
//!
//! # Security
//!
//! - A fresh challenge is drawn for every attempt, so a signature captured
//!   from an earlier attempt never verifies
//! - No session key exists until the peer's signature has verified
//! - The signed value is always SHA-256 of the challenge, never the raw
//!   challenge
//!
//! # Limitation: one-sided completion
//!
//! The initiator's signature is the last frame of the exchange and nothing
//! acknowledges it. The initiator reaches `Complete` once that frame is
//! sent, before the responder has verified it. If the responder rejects it
//! (or never receives it), the initiator holds a session while the
//! responder does not.
//!
//! Authentication still holds in that case. The responder never derives a
//! key for a peer it has not verified, so nothing the initiator sends under
//! the one-sided session is ever accepted. The gap is in liveness only: the
//! initiator learns of the failure when its messages go unanswered or the
//! link closes, and recovers by re-keying (`SecureMessenger::into_peer`).

use std::fmt;

use sealink_crypto::{SessionKey, derive_session_key, hash, verify_signature};
use sealink_proto::{Challenge, FixedFrame, RawPublicKey, RawSignature};

use crate::{
    config::Role,
    env::Environment,
    error::{AttemptError, AuthenticationError, SessionError},
    secure_element::{KeyPairHandle, SecureElement},
    session::{EstablishedSession, PeerPublicKey},
    transport::{Transport, receive_fixed, send_fixed},
};

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// No attempt in progress
    Idle,
    /// Sending our identity public key
    SendOwnPublicKey,
    /// Waiting for the peer's identity public key
    AwaitPeerPublicKey,
    /// Sending a fresh challenge
    SendChallenge,
    /// Waiting for the peer's signature over our challenge
    AwaitPeerSignatureAndVerify,
    /// Waiting for the peer's challenge
    AwaitPeerChallenge,
    /// Signing the peer's challenge and sending the signature
    SignAndSendResponse,
    /// Running ECDH and deriving the session key
    DeriveSessionKey,
    /// Session established
    Complete,
    /// Retries exhausted; no further attempts will be made
    Fatal,
}

const INITIATOR_STEPS: [HandshakeState; 9] = [
    HandshakeState::Idle,
    HandshakeState::SendOwnPublicKey,
    HandshakeState::AwaitPeerPublicKey,
    HandshakeState::SendChallenge,
    HandshakeState::AwaitPeerSignatureAndVerify,
    HandshakeState::AwaitPeerChallenge,
    HandshakeState::SignAndSendResponse,
    HandshakeState::DeriveSessionKey,
    HandshakeState::Complete,
];

const RESPONDER_STEPS: [HandshakeState; 9] = [
    HandshakeState::Idle,
    HandshakeState::AwaitPeerPublicKey,
    HandshakeState::SendOwnPublicKey,
    HandshakeState::AwaitPeerChallenge,
    HandshakeState::SignAndSendResponse,
    HandshakeState::SendChallenge,
    HandshakeState::AwaitPeerSignatureAndVerify,
    HandshakeState::DeriveSessionKey,
    HandshakeState::Complete,
];

impl HandshakeState {
    /// Successor of this state for `role`, or `None` once terminal.
    pub fn next(self, role: Role) -> Option<Self> {
        let steps = match role {
            Role::Initiator => &INITIATOR_STEPS,
            Role::Responder => &RESPONDER_STEPS,
        };
        let position = steps.iter().position(|step| *step == self)?;
        steps.get(position + 1).copied()
    }

    /// True for `Complete` and `Fatal`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Fatal)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SendOwnPublicKey => "send-public-key",
            Self::AwaitPeerPublicKey => "await-peer-public-key",
            Self::SendChallenge => "send-challenge",
            Self::AwaitPeerSignatureAndVerify => "await-peer-signature",
            Self::AwaitPeerChallenge => "await-peer-challenge",
            Self::SignAndSendResponse => "sign-and-send-response",
            Self::DeriveSessionKey => "derive-session-key",
            Self::Complete => "complete",
            Self::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// One handshake attempt.
///
/// Holds everything produced along the way. Dropped at the end of the
/// attempt, so nothing (challenges in particular) carries over into a
/// retry.
pub(crate) struct KeyExchange<'a, SE: ?Sized, T: ?Sized, E> {
    element: &'a mut SE,
    transport: &'a mut T,
    env: &'a E,
    identity: &'a KeyPairHandle,
    role: Role,
    state: HandshakeState,
    peer_key: Option<PeerPublicKey>,
    own_challenge: Option<Challenge>,
    peer_challenge: Option<Challenge>,
    session_key: Option<SessionKey>,
}

impl<'a, SE, T, E> KeyExchange<'a, SE, T, E>
where
    SE: SecureElement + ?Sized,
    T: Transport + ?Sized,
    E: Environment,
{
    pub(crate) fn new(
        element: &'a mut SE,
        transport: &'a mut T,
        env: &'a E,
        identity: &'a KeyPairHandle,
        role: Role,
    ) -> Self {
        Self {
            element,
            transport,
            env,
            identity,
            role,
            state: HandshakeState::Idle,
            peer_key: None,
            own_challenge: None,
            peer_challenge: None,
            session_key: None,
        }
    }

    /// Drive the attempt from `Idle` to `Complete`.
    pub(crate) fn run(mut self) -> Result<EstablishedSession, AttemptError> {
        while let Some(next) = self.state.next(self.role) {
            tracing::debug!(role = %self.role, from = %self.state, to = %next, "handshake transition");
            self.state = next;

            if let Err(source) = self.step() {
                return Err(AttemptError { state: self.state, source });
            }
        }

        let state = self.state;
        self.finish().map_err(|source| AttemptError { state, source })
    }

    fn step(&mut self) -> Result<(), SessionError> {
        match self.state {
            HandshakeState::Idle | HandshakeState::Complete | HandshakeState::Fatal => Ok(()),
            HandshakeState::SendOwnPublicKey => {
                send_fixed(&mut *self.transport, self.identity.public_key())
            },
            HandshakeState::AwaitPeerPublicKey => {
                let raw: RawPublicKey = receive_fixed(&mut *self.transport)?;
                self.peer_key = Some(PeerPublicKey::validate(raw)?);
                Ok(())
            },
            HandshakeState::SendChallenge => {
                let challenge = Challenge::from_bytes(self.env.random_array());
                send_fixed(&mut *self.transport, &challenge)?;
                self.own_challenge = Some(challenge);
                Ok(())
            },
            HandshakeState::AwaitPeerSignatureAndVerify => {
                let signature: RawSignature = receive_fixed(&mut *self.transport)?;
                let challenge = self.own_challenge.take().ok_or(self.missing("verify signature"))?;
                let peer_key = self.peer_key.ok_or(self.missing("verify signature"))?;

                if !verify_signature(peer_key.as_raw(), &hash(challenge.as_bytes()), &signature) {
                    return Err(AuthenticationError::SignatureMismatch.into());
                }
                Ok(())
            },
            HandshakeState::AwaitPeerChallenge => {
                self.peer_challenge = Some(receive_fixed(&mut *self.transport)?);
                Ok(())
            },
            HandshakeState::SignAndSendResponse => {
                let challenge =
                    self.peer_challenge.take().ok_or(self.missing("sign peer challenge"))?;
                let signature =
                    self.element.sign(self.identity.slot(), &hash(challenge.as_bytes()))?;
                send_fixed(&mut *self.transport, &signature)
            },
            HandshakeState::DeriveSessionKey => {
                let peer_key = self.peer_key.ok_or(self.missing("derive session key"))?;
                let shared_secret = self.element.ecdh(self.identity.slot(), peer_key.as_raw())?;
                self.session_key = Some(derive_session_key(&shared_secret));
                Ok(())
            },
        }
    }

    fn finish(self) -> Result<EstablishedSession, SessionError> {
        let state = self.state;
        match (self.session_key, self.peer_key) {
            (Some(session_key), Some(peer_key)) if state == HandshakeState::Complete => {
                Ok(EstablishedSession::new(session_key, peer_key))
            },
            _ => Err(SessionError::InvalidState { state, operation: "complete handshake" }),
        }
    }

    fn missing(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState { state: self.state, operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(role: Role) -> Vec<HandshakeState> {
        let mut steps = vec![HandshakeState::Idle];
        while let Some(next) = steps.last().and_then(|state| state.next(role)) {
            steps.push(next);
        }
        steps
    }

    fn counterpart_step(state: HandshakeState) -> HandshakeState {
        match state {
            HandshakeState::SendOwnPublicKey => HandshakeState::AwaitPeerPublicKey,
            HandshakeState::AwaitPeerPublicKey => HandshakeState::SendOwnPublicKey,
            HandshakeState::SendChallenge => HandshakeState::AwaitPeerChallenge,
            HandshakeState::AwaitPeerChallenge => HandshakeState::SendChallenge,
            HandshakeState::SignAndSendResponse => HandshakeState::AwaitPeerSignatureAndVerify,
            HandshakeState::AwaitPeerSignatureAndVerify => HandshakeState::SignAndSendResponse,
            other => other,
        }
    }

    #[test]
    fn initiator_sequence() {
        assert_eq!(walk(Role::Initiator), INITIATOR_STEPS.to_vec());
    }

    #[test]
    fn every_send_meets_a_receive() {
        let initiator = walk(Role::Initiator);
        let responder = walk(Role::Responder);
        assert_eq!(initiator.len(), responder.len());

        for (ours, theirs) in initiator.iter().zip(&responder) {
            assert_eq!(counterpart_step(*ours), *theirs, "{ours} does not line up with {theirs}");
        }
    }

    #[test]
    fn peer_signature_is_verified_before_key_derivation() {
        for role in [Role::Initiator, Role::Responder] {
            let steps = walk(role);
            let verify = steps.iter().position(|s| *s == HandshakeState::AwaitPeerSignatureAndVerify);
            let derive = steps.iter().position(|s| *s == HandshakeState::DeriveSessionKey);

            assert!(verify < derive, "{role} derives the key before verifying the peer");
        }
    }

    #[test]
    fn terminal_states_have_no_successor() {
        for role in [Role::Initiator, Role::Responder] {
            assert_eq!(HandshakeState::Complete.next(role), None);
            assert_eq!(HandshakeState::Fatal.next(role), None);
        }
        assert!(HandshakeState::Fatal.is_terminal());
        assert!(!HandshakeState::DeriveSessionKey.is_terminal());
    }
}
