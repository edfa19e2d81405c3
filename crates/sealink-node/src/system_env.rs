//! Production Environment backed by the OS clock and entropy source.
//!
//! Timing and randomness are real and therefore not reproducible. The
//! simulation harness provides the deterministic counterpart.

use std::time::Duration;

use sealink_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// Uses `std::time::Instant::now()` for time, `std::thread::sleep()` for the
/// retry backoff, and getrandom for randomness.
///
/// # Security
///
/// The RNG uses getrandom, which reads OS-level cryptographic randomness
/// (`getrandom(2)` or `/dev/urandom` on Linux, `BCryptGenRandom` on
/// Windows). Identity keys, challenges and every message IV come from here.
///
/// # Panics
///
/// Panics if the OS RNG fails. A node without a working entropy source would
/// produce predictable challenges and IVs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::disallowed_methods)]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - node cannot operate securely");
    }
}
