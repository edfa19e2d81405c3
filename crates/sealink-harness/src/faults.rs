//! Fault-injecting transports.

use std::collections::HashMap;

use sealink_core::{IoError, Transport};

/// A link whose peer never answers.
///
/// Sends succeed, every receive times out immediately. Counts both so tests
/// can tell how many attempts a retry loop made.
#[derive(Debug, Default)]
pub struct DeadLink {
    sends: usize,
    receives: usize,
}

impl DeadLink {
    /// Fresh dead link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends accepted so far.
    pub fn sends(&self) -> usize {
        self.sends
    }

    /// Receives attempted so far.
    pub fn receives(&self) -> usize {
        self.receives
    }
}

impl Transport for DeadLink {
    fn send(&mut self, _frame: &[u8]) -> Result<(), IoError> {
        self.sends += 1;
        Ok(())
    }

    fn receive_frame(&mut self, _max_len: usize) -> Result<Vec<u8>, IoError> {
        self.receives += 1;
        Err(IoError::Timeout)
    }
}

/// Flips bits in chosen incoming frames before the protocol sees them.
///
/// Frames are numbered from zero in arrival order at this end.
pub struct Tamper<T> {
    inner: T,
    flips: HashMap<usize, (usize, u8)>,
    received: usize,
}

impl<T: Transport> Tamper<T> {
    /// Wrap a transport with no tampering configured.
    pub fn new(inner: T) -> Self {
        Self { inner, flips: HashMap::new(), received: 0 }
    }

    /// XOR `mask` into byte `offset` of incoming frame `frame_index`.
    #[must_use]
    pub fn flip(mut self, frame_index: usize, offset: usize, mask: u8) -> Self {
        self.flips.insert(frame_index, (offset, mask));
        self
    }

    /// Incoming frames seen so far.
    pub fn frames_received(&self) -> usize {
        self.received
    }
}

impl<T: Transport> Transport for Tamper<T> {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        self.inner.send(frame)
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        let mut frame = self.inner.receive_frame(max_len)?;
        let index = self.received;
        self.received += 1;

        if let Some(&(offset, mask)) = self.flips.get(&index) {
            if let Some(byte) = frame.get_mut(offset) {
                tracing::debug!(index, offset, mask, "tampering with incoming frame");
                *byte ^= mask;
            }
        }
        Ok(frame)
    }
}

/// Fails the first `n` sends with a timeout, then behaves like `inner`.
///
/// A failed send never reaches the inner link, so the peer sees nothing and
/// no stray frame is left behind for a later attempt.
pub struct Flaky<T> {
    inner: T,
    failures_left: usize,
}

impl<T: Transport> Flaky<T> {
    /// Wrap a transport whose first `failures` sends time out.
    pub fn fail_sends(inner: T, failures: usize) -> Self {
        Self { inner, failures_left: failures }
    }
}

impl<T: Transport> Transport for Flaky<T> {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            tracing::debug!(len = frame.len(), left = self.failures_left, "failing send");
            return Err(IoError::Timeout);
        }
        self.inner.send(frame)
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        self.inner.receive_frame(max_len)
    }
}
