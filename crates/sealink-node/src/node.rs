//! Running a node: open the TCP link, establish the session, move messages.
//!
//! The message loops are generic over the protocol seams so that tests can
//! drive them over the in-memory link from the simulation harness.

use std::{
    io::{BufRead, Write},
    net::{TcpListener, TcpStream},
};

use sealink_core::{
    Environment, IoError, Peer, ProtocolConfig, SecureElement, SecureElementConfig,
    SecureMessenger, SessionError, SoftSecureElement, StreamTransport, Transport,
};

use crate::{
    config::{Endpoint, Mode, NodeConfig},
    console::{Console, write_message},
    error::NodeError,
    system_env::SystemEnv,
};

/// Messenger as wired up by a production node.
pub type NodeMessenger =
    SecureMessenger<SoftSecureElement<SystemEnv>, StreamTransport<TcpStream>, SystemEnv>;

/// Open the TCP connection described by `endpoint`.
///
/// A listening node accepts exactly one connection.
///
/// # Errors
///
/// Returns `NodeError::Io` if binding, accepting or connecting fails.
pub fn open_link(endpoint: &Endpoint, config: &ProtocolConfig) -> Result<TcpStream, NodeError> {
    let stream = match endpoint {
        Endpoint::Listen(addr) => {
            let listener = TcpListener::bind(addr)?;
            tracing::info!(addr = %listener.local_addr()?, "waiting for peer");
            let (stream, peer) = listener.accept()?;
            tracing::info!(%peer, "peer connected");
            stream
        },
        Endpoint::Connect(addr) => {
            let stream = TcpStream::connect_timeout(addr, config.io_timeout)?;
            tracing::info!(peer = %addr, "connected");
            stream
        },
    };
    Ok(stream)
}

/// Provision a fresh identity and run the handshake over `stream`.
///
/// # Errors
///
/// - `NodeError::Io` if the socket options cannot be set
/// - `NodeError::Device` if the identity key cannot be generated
/// - `NodeError::Handshake` if every attempt fails
pub fn secure_session(
    stream: TcpStream,
    config: ProtocolConfig,
) -> Result<NodeMessenger, NodeError> {
    stream.set_read_timeout(Some(config.io_timeout))?;
    stream.set_write_timeout(Some(config.io_timeout))?;
    stream.set_nodelay(true)?;

    let env = SystemEnv::new();
    let element = SoftSecureElement::init(SecureElementConfig::default(), env)?;
    let peer = Peer::provision(element, StreamTransport::new(stream), env, config)?;

    Ok(peer.establish()?)
}

/// Run a node to completion.
///
/// In `Send` mode the node returns at end of input; in `Receive` mode, when
/// the peer closes the link.
///
/// # Errors
///
/// Returns the first error that ends the run. Failures of a single message
/// are logged and do not end it.
pub fn run<R, W>(config: &NodeConfig, input: R, output: W) -> Result<(), NodeError>
where
    R: BufRead,
    W: Write,
{
    let protocol = config.protocol();
    tracing::info!(endpoint = %config.endpoint, role = %protocol.role, mode = ?config.mode, "node starting");

    let stream = open_link(&config.endpoint, &protocol)?;
    let mut messenger = secure_session(stream, protocol)?;
    tracing::info!("secure session established");

    match config.mode {
        Mode::Send => {
            let sent = send_lines(&mut messenger, input)?;
            tracing::info!(sent, "input finished");
        },
        Mode::Receive => {
            let received = receive_lines(&mut messenger, output)?;
            tracing::info!(received, "peer closed the link");
        },
    }
    Ok(())
}

/// Send every console line from `input` as one message.
///
/// Returns the number of messages sent.
///
/// # Errors
///
/// - `NodeError::Io` if reading `input` fails
/// - `NodeError::Session` once the link is closed
pub fn send_lines<SE, T, E, R>(
    messenger: &mut SecureMessenger<SE, T, E>,
    input: R,
) -> Result<u64, NodeError>
where
    SE: SecureElement,
    T: Transport,
    E: Environment,
    R: BufRead,
{
    let mut console = Console::new(input);
    let mut sent = 0u64;

    while let Some(message) = console.next_message()? {
        match messenger.send(&message) {
            Ok(sealed) => {
                sent += 1;
                tracing::debug!(len = sealed.ciphertext.len(), "message sent");
            },
            Err(e) if e.is_link_closed() => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "message dropped"),
        }
    }
    Ok(sent)
}

/// Write every message received on `messenger` to `output` until the peer
/// closes the link.
///
/// Returns the number of messages delivered. An idle link is not an error:
/// read timeouts between messages are skipped.
///
/// # Errors
///
/// - `NodeError::Io` if writing `output` fails
/// - `NodeError::Session` for a link failure other than timeout or close
pub fn receive_lines<SE, T, E, W>(
    messenger: &mut SecureMessenger<SE, T, E>,
    mut output: W,
) -> Result<u64, NodeError>
where
    SE: SecureElement,
    T: Transport,
    E: Environment,
    W: Write,
{
    let mut received = 0u64;

    loop {
        match messenger.receive() {
            Ok(message) => {
                received += 1;
                write_message(&mut output, &message)?;
            },
            Err(e) if e.is_link_closed() => return Ok(received),
            Err(SessionError::Io(IoError::Timeout)) => tracing::trace!("link idle"),
            Err(SessionError::Io(e @ IoError::Link(_))) => return Err(SessionError::Io(e).into()),
            Err(e) => tracing::warn!(error = %e, "message rejected"),
        }
    }
}
