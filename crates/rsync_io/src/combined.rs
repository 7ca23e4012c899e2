use std::io::{self, Read, Write};

/// Joins an independent reader and writer into one `Read + Write` value,
/// for stages (the handshake) that interleave reads and writes
/// on what is conceptually a single channel even though the underlying
/// transport (stdio, an in-process pipe) exposes them as separate handles.
pub struct Combined<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Combined<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_halves(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W> Read for Combined<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for Combined<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
