//! Deterministic environment for unit tests.
//!
//! Random bytes come from SHA-256 in counter mode over a seed, and sleeps
//! only advance a virtual clock.

use std::{cell::RefCell, rc::Rc, time::Duration};

use sealink_crypto::hash;

use crate::env::Environment;

#[derive(Clone)]
pub(crate) struct TestEnv {
    state: Rc<RefCell<State>>,
}

struct State {
    seed: u64,
    counter: u64,
    clock: Duration,
    sleeps: Vec<Duration>,
    frozen: Option<u8>,
}

impl TestEnv {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                seed,
                counter: 0,
                clock: Duration::ZERO,
                sleeps: Vec::new(),
                frozen: None,
            })),
        }
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.state.borrow().sleeps.clone()
    }

    /// Make every subsequent random draw return `byte` repeated.
    pub(crate) fn freeze_random(&self, byte: u8) {
        self.state.borrow_mut().frozen = Some(byte);
    }
}

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.state.borrow().clock
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.borrow_mut();
        state.clock += duration;
        state.sleeps.push(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        if let Some(byte) = state.frozen {
            buffer.fill(byte);
            return;
        }

        for chunk in buffer.chunks_mut(32) {
            let mut input = [0u8; 16];
            input[..8].copy_from_slice(&state.seed.to_be_bytes());
            input[8..].copy_from_slice(&state.counter.to_be_bytes());
            state.counter += 1;

            let block = hash(&input);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}
