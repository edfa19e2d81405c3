//! In-memory, frame-preserving link between two peers.
//!
//! Each direction is an unbounded channel of frames, so a sender never
//! blocks and a receiver waits at most the configured timeout. Timeouts use
//! the real clock; keep them short in tests that expect one to fire.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel},
    time::Duration,
};

use sealink_core::{IoError, Transport};

/// One end of an in-memory link.
pub struct MemoryLink {
    outgoing: Sender<Vec<u8>>,
    incoming: Receiver<Vec<u8>>,
    timeout: Duration,
    frames_sent: usize,
    frames_received: usize,
}

impl MemoryLink {
    /// Two connected ends.
    pub fn pair(timeout: Duration) -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (Self::new(a_tx, a_rx, timeout), Self::new(b_tx, b_rx, timeout))
    }

    fn new(outgoing: Sender<Vec<u8>>, incoming: Receiver<Vec<u8>>, timeout: Duration) -> Self {
        Self { outgoing, incoming, timeout, frames_sent: 0, frames_received: 0 }
    }

    /// Frames this end has put on the link.
    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    /// Frames this end has taken off the link.
    pub fn frames_received(&self) -> usize {
        self.frames_received
    }

    /// Take every frame already waiting at this end without blocking.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let frames: Vec<Vec<u8>> = self.incoming.try_iter().collect();
        self.frames_received += frames.len();
        frames
    }
}

impl Transport for MemoryLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        self.outgoing.send(frame.to_vec()).map_err(|_| IoError::Closed)?;
        self.frames_sent += 1;
        Ok(())
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        let frame = self.incoming.recv_timeout(self.timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => IoError::Timeout,
            RecvTimeoutError::Disconnected => IoError::Closed,
        })?;
        self.frames_received += 1;

        if frame.len() > max_len {
            return Err(IoError::Overrun { expected: max_len, received: frame.len() });
        }
        Ok(frame)
    }
}
