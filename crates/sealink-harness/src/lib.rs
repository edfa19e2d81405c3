//! Deterministic simulation harness for Sealink protocol testing.
//!
//! Implementations of the Environment and Transport traits for reproducible
//! testing of the handshake and messenger under link failures, tampering and
//! broken entropy.
//!
//! - [`SimEnv`]: seeded RNG, virtual clock, recorded sleeps
//! - [`MemoryLink`]: frame-preserving in-memory link with a receive timeout
//! - [`DeadLink`], [`Flaky`], [`Tamper`]: fault injection
//! - [`scenario`]: provisioned peers and concurrent handshakes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod memory_link;
pub mod scenario;
pub mod sim_env;

pub use faults::{DeadLink, Flaky, Tamper};
pub use memory_link::MemoryLink;
pub use scenario::{
    PairOutcome, SIM_IO_TIMEOUT, SimMessenger, SimPeer, establish, establish_pair, linked_pair,
    sim_config, sim_peer,
};
pub use sim_env::SimEnv;
