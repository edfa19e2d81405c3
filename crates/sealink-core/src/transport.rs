//! Frame transport abstraction.
//!
//! The protocol talks to its peer through a [`Transport`]: one `send` puts
//! one frame on the link, and one `receive_frame` takes one frame off. The
//! transport owns the timeout, so a silent peer surfaces as
//! [`IoError::Timeout`] rather than a hang.
//!
//! Links that preserve frame boundaries (a UART driver with packet framing,
//! an in-memory channel) implement the trait directly. Byte streams such as
//! TCP go through [`StreamTransport`], which prefixes each frame with a
//! one-byte length.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};
use sealink_proto::FixedFrame;

use crate::error::{IoError, SessionError};

/// Largest frame a one-byte length prefix can describe.
pub const MAX_STREAM_FRAME: usize = u8::MAX as usize;

/// Blocking, frame-preserving link to the peer.
pub trait Transport {
    /// Send one frame.
    ///
    /// # Errors
    ///
    /// - `Closed` if the peer has gone away
    /// - `Link` on any other link failure
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError>;

    /// Receive the next frame, accepting at most `max_len` bytes.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no frame arrives in time
    /// - `Overrun` if the frame is longer than `max_len`
    /// - `ShortTransfer` if the frame was cut off mid-transfer
    /// - `Closed` if the peer has gone away
    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError>;

    /// Receive a frame of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Everything [`Transport::receive_frame`] reports, plus `ShortTransfer`
    /// when the frame is shorter than `len`.
    fn receive(&mut self, len: usize) -> Result<Vec<u8>, IoError> {
        let frame = self.receive_frame(len)?;
        if frame.len() < len {
            return Err(IoError::ShortTransfer { expected: len, received: frame.len() });
        }
        Ok(frame)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        (**self).send(frame)
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        (**self).receive_frame(max_len)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        (**self).send(frame)
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        (**self).receive_frame(max_len)
    }
}

/// Send one fixed-size frame.
pub fn send_fixed<F, T>(transport: &mut T, frame: &F) -> Result<(), SessionError>
where
    F: FixedFrame,
    T: Transport + ?Sized,
{
    transport.send(frame.as_bytes())?;
    Ok(())
}

/// Receive and parse one fixed-size frame.
pub fn receive_fixed<F, T>(transport: &mut T) -> Result<F, SessionError>
where
    F: FixedFrame,
    T: Transport + ?Sized,
{
    let bytes = transport.receive(F::SIZE)?;
    Ok(F::from_slice(&bytes)?)
}

/// Map an OS-level I/O failure onto the link error taxonomy.
pub fn map_io_error(err: &io::Error) -> IoError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => IoError::Timeout,
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => IoError::Closed,
        _ => IoError::Link(err.to_string()),
    }
}

/// Frame transport over a byte stream.
///
/// Wire format per frame: `len: u8` followed by `len` payload bytes. The
/// prefix only restores frame boundaries the stream loses; it is not part
/// of the protocol. Timeouts come from the stream itself (for TCP, set
/// `set_read_timeout` before wrapping).
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Read until `buf` is full, the stream ends, or it errors.
    ///
    /// Returns the number of bytes read. An error is only returned when it
    /// happens before any byte arrived; a failure mid-read is reported as a
    /// short count.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) if filled == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(filled)
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn send(&mut self, frame: &[u8]) -> Result<(), IoError> {
        let Ok(len) = u8::try_from(frame.len()) else {
            return Err(IoError::Overrun { expected: MAX_STREAM_FRAME, received: frame.len() });
        };

        let mut buf = BytesMut::with_capacity(1 + frame.len());
        buf.put_u8(len);
        buf.put_slice(frame);

        self.stream.write_all(&buf).map_err(|e| map_io_error(&e))?;
        self.stream.flush().map_err(|e| map_io_error(&e))
    }

    fn receive_frame(&mut self, max_len: usize) -> Result<Vec<u8>, IoError> {
        let mut prefix = [0u8; 1];
        match self.fill(&mut prefix) {
            Ok(0) => return Err(IoError::Closed),
            Ok(_) => {},
            Err(e) => return Err(map_io_error(&e)),
        }

        let len = usize::from(prefix[0]);
        let mut payload = vec![0u8; len];
        let received = match self.fill(&mut payload) {
            Ok(n) => n,
            Err(e) if map_io_error(&e) == IoError::Timeout => 0,
            Err(e) => return Err(map_io_error(&e)),
        };

        if received < len {
            return Err(IoError::ShortTransfer { expected: len, received });
        }
        // The oversized payload has been consumed, so the stream stays
        // aligned on the next frame.
        if len > max_len {
            return Err(IoError::Overrun { expected: max_len, received: len });
        }

        Ok(payload)
    }
}
