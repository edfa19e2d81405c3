//! Simulated environment: seeded RNG and a virtual clock.
//!
//! Sleeps advance the clock instantly and are recorded, so a test can assert
//! the exact backoff schedule of the retry loop without waiting for it.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sealink_core::Environment;

struct SimState {
    rng: ChaCha8Rng,
    clock: Duration,
    sleeps: Vec<Duration>,
    frozen: Option<u8>,
}

/// Deterministic [`Environment`] for simulation.
///
/// Clones share the same clock and RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Environment whose random stream is fully determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                clock: Duration::ZERO,
                sleeps: Vec::new(),
                frozen: None,
            })),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.lock().clock
    }

    /// Advance the virtual clock without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.lock().clock += duration;
    }

    /// Make every later random draw return `byte` repeated, modelling a
    /// stuck entropy source.
    pub fn freeze_random(&self, byte: u8) {
        self.lock().frozen = Some(byte);
    }

    /// Resume drawing from the seeded stream.
    pub fn unfreeze_random(&self) {
        self.lock().frozen = None;
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread poisons the lock; the state is still
        // consistent, so keep going and let the test report its own failure.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.lock().clock
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.clock += duration;
        state.sleeps.push(duration);
        tracing::trace!(?duration, clock = ?state.clock, "virtual sleep");
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.lock();
        match state.frozen {
            Some(byte) => buffer.fill(byte),
            None => state.rng.fill_bytes(buffer),
        }
    }
}
