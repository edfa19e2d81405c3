//! Ready-made peers and paired handshakes.
//!
//! A handshake needs both sides running at once, so [`establish_pair`]
//! drives each peer on its own scoped thread and joins them. Everything
//! else about a simulated peer (RNG, clock, secure element) is
//! deterministic for a given seed.

use std::{panic, thread, time::Duration};

use sealink_core::{
    DeviceError, HandshakeError, Peer, ProtocolConfig, Role, SecureElementConfig,
    SecureMessenger, SoftSecureElement, Transport,
};

use crate::{memory_link::MemoryLink, sim_env::SimEnv};

/// Link timeout used by simulated peers.
///
/// Real time, because the in-memory link blocks on a channel. Long enough
/// for the other thread to answer, short enough to keep failure tests fast.
pub const SIM_IO_TIMEOUT: Duration = Duration::from_millis(500);

/// Peer backed by a software secure element and a simulated environment.
pub type SimPeer<T = MemoryLink> = Peer<SoftSecureElement<SimEnv>, T, SimEnv>;

/// Messenger produced by a [`SimPeer`].
pub type SimMessenger<T = MemoryLink> = SecureMessenger<SoftSecureElement<SimEnv>, T, SimEnv>;

/// Protocol configuration for simulation.
pub fn sim_config(role: Role) -> ProtocolConfig {
    ProtocolConfig { io_timeout: SIM_IO_TIMEOUT, ..ProtocolConfig::for_role(role) }
}

/// Provision a simulated peer over `transport`.
///
/// # Errors
///
/// Propagates secure element failures from provisioning.
pub fn sim_peer<T: Transport>(
    seed: u64,
    config: ProtocolConfig,
    transport: T,
) -> Result<SimPeer<T>, DeviceError> {
    let env = SimEnv::with_seed(seed);
    let element = SoftSecureElement::init(SecureElementConfig::default(), env.clone())?;
    Peer::provision(element, transport, env, config)
}

/// Two provisioned peers joined by a fresh in-memory link.
///
/// The first peer is the initiator.
///
/// # Errors
///
/// Propagates secure element failures from provisioning.
pub fn linked_pair(
    initiator_seed: u64,
    responder_seed: u64,
) -> Result<(SimPeer, SimPeer), DeviceError> {
    let (a, b) = MemoryLink::pair(SIM_IO_TIMEOUT);
    let initiator = sim_peer(initiator_seed, sim_config(Role::Initiator), a)?;
    let responder = sim_peer(responder_seed, sim_config(Role::Responder), b)?;
    Ok((initiator, responder))
}

/// Result of running both sides of a handshake.
pub type PairOutcome<TA, TB> =
    (Result<SimMessenger<TA>, HandshakeError>, Result<SimMessenger<TB>, HandshakeError>);

/// Run [`Peer::establish`] on both peers concurrently.
pub fn establish<TA, TB>(first: SimPeer<TA>, second: SimPeer<TB>) -> PairOutcome<TA, TB>
where
    TA: Transport + Send,
    TB: Transport + Send,
{
    thread::scope(|scope| {
        let first = scope.spawn(move || first.establish());
        let second = scope.spawn(move || second.establish());

        let first = first.join().unwrap_or_else(|payload| panic::resume_unwind(payload));
        let second = second.join().unwrap_or_else(|payload| panic::resume_unwind(payload));
        (first, second)
    })
}

/// Provision two linked peers and establish a session between them.
///
/// # Errors
///
/// Propagates secure element failures from provisioning. Handshake
/// failures are returned per side.
pub fn establish_pair(
    initiator_seed: u64,
    responder_seed: u64,
) -> Result<PairOutcome<MemoryLink, MemoryLink>, DeviceError> {
    let (initiator, responder) = linked_pair(initiator_seed, responder_seed)?;
    Ok(establish(initiator, responder))
}
