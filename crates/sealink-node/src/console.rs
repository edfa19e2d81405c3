//! Console input and output for the node.
//!
//! Input is read as raw bytes, one message per line. Line terminators are
//! stripped, empty lines are skipped, and anything longer than a single
//! message can carry is truncated rather than rejected.

use std::io::{self, BufRead, Write};

use sealink_proto::MAX_PLAINTEXT_SIZE;

/// Reduce one input line to a sendable message.
///
/// Returns `None` for a line that is empty once `\n` / `\r\n` is removed.
pub fn prepare_message(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    if line.len() > MAX_PLAINTEXT_SIZE {
        tracing::debug!(len = line.len(), max = MAX_PLAINTEXT_SIZE, "truncating console line");
    }
    Some(&line[..line.len().min(MAX_PLAINTEXT_SIZE)])
}

/// Line-oriented message source.
pub struct Console<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> Console<R> {
    /// Read messages from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader, line: Vec::with_capacity(MAX_PLAINTEXT_SIZE + 2) }
    }

    /// Next non-empty message, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Propagates read failures of the underlying reader.
    pub fn next_message(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            if let Some(message) = prepare_message(&self.line) {
                return Ok(Some(message.to_vec()));
            }
        }
    }
}

/// Write a received message as one output line.
///
/// Invalid UTF-8 is replaced rather than rejected; the console is for
/// humans.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_message<W: Write>(output: &mut W, message: &[u8]) -> io::Result<()> {
    writeln!(output, "{}", String::from_utf8_lossy(message))?;
    output.flush()
}
