//! Environment abstraction for deterministic testing.
//!
//! Separates protocol logic from system resources (time, randomness, blocking
//! waits). Production wires in the OS clock and entropy source; the
//! simulation harness substitutes a virtual clock and a seeded RNG so that
//! every retry schedule and every IV sequence is reproducible.

use std::{ops::Sub, time::Duration};

/// Time, randomness and blocking waits as seen by the protocol.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Clones share one underlying clock and entropy stream, so the peer and
///   its secure element observe the same environment
pub trait Environment: Clone {
    /// Instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`, simulation uses a virtual
    /// offset from the start of the run.
    type Instant: Copy + Ord + Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Block the calling thread for `duration`.
    ///
    /// Only the retry loop calls this. A simulated environment advances its
    /// virtual clock instead of waiting.
    fn sleep(&self, duration: Duration);

    /// Fill `buffer` with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses a cryptographically secure RNG in production
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Fixed-size convenience wrapper over [`Environment::random_bytes`].
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}
