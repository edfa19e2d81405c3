//! Sealink node.
//!
//! Runs one end of a Sealink secure link over TCP, with real time, OS
//! randomness and a software secure element.
//!
//! # Architecture
//!
//! This crate is production glue around [`sealink_core`]. The protocol
//! itself (handshake, retry policy, sealing and opening of messages) lives
//! there and is transport-agnostic; this crate supplies:
//!
//! - [`SystemEnv`]: the OS clock, blocking sleep and getrandom
//! - [`node::open_link`]: a single TCP connection, wrapped in the
//!   length-prefixed [`sealink_core::StreamTransport`]
//! - [`Console`]: line-oriented input and output for the message loops
//!
//! The listening node is the responder and the connecting node the
//! initiator, so the two sides never wait on each other during the
//! handshake.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod console;
mod error;
pub mod node;
mod system_env;

pub use config::{Endpoint, Mode, NodeConfig};
pub use console::{Console, prepare_message, write_message};
pub use error::NodeError;
pub use node::{NodeMessenger, receive_lines, run, secure_session, send_lines};
pub use system_env::SystemEnv;
