//! Local endpoint: identity, link and retry policy.
//!
//! A [`Peer`] owns the secure element, the transport and the environment.
//! It provisions the identity key once, then runs handshake attempts until
//! one succeeds or the retry budget runs out:
//!
//! ```text
//! attempt 1 ── fail ── sleep(backoff) ── attempt 2 ── fail ── sleep(backoff) ── attempt 3 ── fail ──▶ RetriesExhausted
//!     │                                      │                                      │
//!     └── ok ──▶ EstablishedSession          └── ok ──▶ ...                         └── ok ──▶ ...
//! ```
//!
//! No backoff follows the final attempt.

use crate::{
    config::ProtocolConfig,
    env::Environment,
    error::{AttemptError, DeviceError, HandshakeError},
    handshake::{HandshakeState, KeyExchange},
    messenger::SecureMessenger,
    secure_element::{KeyPairHandle, SecureElement},
    session::EstablishedSession,
    transport::Transport,
};

/// One end of a Sealink link.
pub struct Peer<SE, T, E> {
    element: SE,
    transport: T,
    env: E,
    config: ProtocolConfig,
    identity: KeyPairHandle,
    state: HandshakeState,
}

impl<SE, T, E> Peer<SE, T, E>
where
    SE: SecureElement,
    T: Transport,
    E: Environment,
{
    /// Generate the identity key and assemble the peer.
    ///
    /// # Errors
    ///
    /// Propagates the secure element's key generation failure.
    pub fn provision(
        mut element: SE,
        transport: T,
        env: E,
        config: ProtocolConfig,
    ) -> Result<Self, DeviceError> {
        let identity = KeyPairHandle::generate(&mut element, config.identity_slot)?;
        tracing::info!(role = %config.role, slot = %identity.slot(), "identity key provisioned");

        Ok(Self { element, transport, env, config, identity, state: HandshakeState::Idle })
    }

    /// Identity key handle.
    pub fn identity(&self) -> &KeyPairHandle {
        &self.identity
    }

    /// Active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// State after the most recent attempt.
    ///
    /// `Idle` before the first attempt and after a failed one that may be
    /// retried, `Complete` after success, `Fatal` once retries ran out.
    pub fn handshake_state(&self) -> HandshakeState {
        self.state
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the secure element.
    pub fn element(&self) -> &SE {
        &self.element
    }

    /// Mutably borrow the secure element.
    pub fn element_mut(&mut self) -> &mut SE {
        &mut self.element
    }

    /// Borrow the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Run exactly one handshake attempt, without retries.
    ///
    /// # Errors
    ///
    /// Returns the state whose step failed together with the cause.
    pub fn handshake_once(&mut self) -> Result<EstablishedSession, AttemptError> {
        let attempt = KeyExchange::new(
            &mut self.element,
            &mut self.transport,
            &self.env,
            &self.identity,
            self.config.role,
        );

        match attempt.run() {
            Ok(session) => {
                self.state = HandshakeState::Complete;
                Ok(session)
            },
            Err(err) => {
                self.state = HandshakeState::Idle;
                Err(err)
            },
        }
    }

    /// Run handshake attempts until one succeeds or `max_attempts` have
    /// failed, sleeping `retry_backoff` between attempts.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the configuration cannot make an attempt
    /// - `RetriesExhausted` carrying the final attempt's failure
    pub fn handshake(&mut self) -> Result<EstablishedSession, HandshakeError> {
        self.config.validate().map_err(|reason| HandshakeError::InvalidConfig { reason })?;

        let started = self.env.now();
        let max_attempts = self.config.max_attempts;
        let mut attempt = 1;

        loop {
            match self.handshake_once() {
                Ok(session) => {
                    tracing::info!(
                        role = %self.config.role,
                        attempt,
                        elapsed = ?(self.env.now() - started),
                        "secure session established"
                    );
                    return Ok(session);
                },
                Err(err) if attempt >= max_attempts => {
                    self.state = HandshakeState::Fatal;
                    tracing::error!(
                        role = %self.config.role,
                        attempts = attempt,
                        error = %err,
                        "handshake retries exhausted"
                    );
                    return Err(HandshakeError::RetriesExhausted { attempts: attempt, last: err });
                },
                Err(err) => {
                    tracing::warn!(
                        role = %self.config.role,
                        attempt,
                        max_attempts,
                        transient = err.source.is_transient(),
                        error = %err,
                        "handshake attempt failed, retrying"
                    );
                    self.env.sleep(self.config.retry_backoff);
                    attempt += 1;
                },
            }
        }
    }

    /// Handshake with retries, then hand the link to a messenger.
    ///
    /// # Errors
    ///
    /// See [`Peer::handshake`].
    pub fn establish(mut self) -> Result<SecureMessenger<SE, T, E>, HandshakeError> {
        let session = self.handshake()?;
        Ok(self.into_messenger(session))
    }

    /// Hand the link to a messenger keyed by an already established session.
    pub fn into_messenger(self, session: EstablishedSession) -> SecureMessenger<SE, T, E> {
        SecureMessenger::new(self, session)
    }

    pub(crate) fn signer(&mut self) -> (&mut SE, &KeyPairHandle) {
        (&mut self.element, &self.identity)
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn reset(&mut self) {
        self.state = HandshakeState::Idle;
    }
}
