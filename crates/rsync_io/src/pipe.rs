use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender};

/// Read half of an in-memory pipe.
///
/// Backed by an unbounded channel of byte chunks rather than a shared ring
/// buffer: each `write` call on the paired [`PipeWriter`] becomes one
/// chunk, and `read` drains chunks in order, slicing across `buf`
/// boundaries as needed.
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl PipeReader {
    fn new(rx: Receiver<Vec<u8>>) -> Self {
        Self { rx, pending: Vec::new(), pos: 0 }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                // Peer writer dropped: treat as a clean EOF, matching the
                // transport's "read returning 0 means end of stream" rule.
                Err(_) => return Ok(0),
            }
        }
        let available = &self.pending[self.pos..];
        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Write half of an in-memory pipe.
pub struct PipeWriter {
    tx: Sender<Vec<u8>>,
}

impl PipeWriter {
    fn new(tx: Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds one bidirectional in-memory pipe and returns its two endpoints,
/// each a `(reader, writer)` pair, for wiring the Sender/Generator/Receiver
/// triad of a local-copy session.
#[must_use]
pub fn pipe_pair() -> ((PipeReader, PipeWriter), (PipeReader, PipeWriter)) {
    let (tx_a_to_b, rx_a_to_b) = mpsc::channel();
    let (tx_b_to_a, rx_b_to_a) = mpsc::channel();
    (
        (PipeReader::new(rx_b_to_a), PipeWriter::new(tx_a_to_b)),
        (PipeReader::new(rx_a_to_b), PipeWriter::new(tx_b_to_a)),
    )
}
