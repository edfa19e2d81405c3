//! Sealink node binary.
//!
//! # Usage
//!
//! ```bash
//! # Receiving side: wait for the peer and print its messages
//! sealink-node --listen 0.0.0.0:7700 --mode receive
//!
//! # Sending side: connect and send each line typed on stdin
//! sealink-node --connect 192.168.1.20:7700 --mode send
//! ```
//!
//! Logs go to stderr so that received messages on stdout stay clean.

use std::{io, net::SocketAddr, time::Duration};

use clap::Parser;
use sealink_core::{MAX_RETRIES, ProtocolConfig};
use sealink_node::{Endpoint, Mode, NodeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealink secure link node
#[derive(Parser, Debug)]
#[command(name = "sealink-node")]
#[command(about = "Authenticated, encrypted point-to-point messaging")]
#[command(version)]
struct Args {
    /// Wait for the peer on this address (responder)
    #[arg(short, long, conflicts_with = "connect", required_unless_present = "connect")]
    listen: Option<SocketAddr>,

    /// Connect to a listening peer (initiator)
    #[arg(short, long)]
    connect: Option<SocketAddr>,

    /// Send console lines or print received messages
    #[arg(short, long, value_enum, default_value = "send")]
    mode: Mode,

    /// Per-frame I/O timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Handshake attempts before giving up
    #[arg(long, default_value_t = MAX_RETRIES)]
    max_attempts: u32,

    /// Delay between handshake attempts in milliseconds
    #[arg(long, default_value = "1000")]
    backoff_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn endpoint(&self) -> Option<Endpoint> {
        match (self.listen, self.connect) {
            (Some(addr), _) => Some(Endpoint::Listen(addr)),
            (None, Some(addr)) => Some(Endpoint::Connect(addr)),
            (None, None) => None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let endpoint = args.endpoint().ok_or("one of --listen or --connect is required")?;
    let config = NodeConfig {
        endpoint,
        mode: args.mode,
        protocol: ProtocolConfig {
            io_timeout: Duration::from_millis(args.timeout_ms),
            max_attempts: args.max_attempts,
            retry_backoff: Duration::from_millis(args.backoff_ms),
            ..ProtocolConfig::for_role(endpoint.role())
        },
    };

    if let Err(e) = sealink_node::run(&config, io::stdin().lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "node stopped");
        return Err(e.into());
    }

    Ok(())
}
