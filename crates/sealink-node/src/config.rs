//! Node runtime configuration.

use std::{fmt, net::SocketAddr};

use sealink_core::{ProtocolConfig, Role};

/// Which side of the TCP connection this node takes.
///
/// The listening node is the responder, the connecting node the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Accept one connection on this address
    Listen(SocketAddr),
    /// Connect to a listening node at this address
    Connect(SocketAddr),
}

impl Endpoint {
    /// Handshake role implied by the endpoint.
    pub fn role(&self) -> Role {
        match self {
            Self::Listen(_) => Role::Responder,
            Self::Connect(_) => Role::Initiator,
        }
    }

    /// Socket address to listen on or connect to.
    pub fn addr(&self) -> SocketAddr {
        match self {
            Self::Listen(addr) | Self::Connect(addr) => *addr,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listen(addr) => write!(f, "listen {addr}"),
            Self::Connect(addr) => write!(f, "connect {addr}"),
        }
    }
}

/// What the node does once the session is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Read lines from the console and send each as a message
    Send,
    /// Write every received message to the console
    Receive,
}

/// Complete configuration for one node run.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Where to find the peer
    pub endpoint: Endpoint,
    /// Direction of the message flow
    pub mode: Mode,
    /// Handshake and link parameters
    ///
    /// `protocol.role` is overwritten from the endpoint.
    pub protocol: ProtocolConfig,
}

impl NodeConfig {
    /// Configuration with default protocol parameters for `endpoint`.
    pub fn new(endpoint: Endpoint, mode: Mode) -> Self {
        Self { endpoint, mode, protocol: ProtocolConfig::for_role(endpoint.role()) }
    }

    /// Protocol parameters with the role taken from the endpoint.
    pub fn protocol(&self) -> ProtocolConfig {
        ProtocolConfig { role: self.endpoint.role(), ..self.protocol.clone() }
    }
}

#[cfg(test)]
mod tests {
    use sealink_core::DEFAULT_IO_TIMEOUT;

    use super::*;

    fn addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 7000))
    }

    #[test]
    fn listener_is_responder() {
        assert_eq!(Endpoint::Listen(addr()).role(), Role::Responder);
        assert_eq!(Endpoint::Connect(addr()).role(), Role::Initiator);
    }

    #[test]
    fn endpoint_role_wins_over_protocol_role() {
        let mut config = NodeConfig::new(Endpoint::Listen(addr()), Mode::Receive);
        config.protocol.role = Role::Initiator;

        assert_eq!(config.protocol().role, Role::Responder);
        assert_eq!(config.protocol().io_timeout, DEFAULT_IO_TIMEOUT);
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::Connect(addr()).to_string(), "connect 127.0.0.1:7000");
    }
}
