use std::io::{self, Read, Write};

/// Adapts a read-only source into something [`protocol::BufferedChannel`]
/// can wrap, which requires `Read + Write` even on a half that only ever
/// reads. The `Write` side is never exercised: nothing in
/// [`protocol::MultiplexReader`] calls it.
pub struct ReadHalf<R>(R);

impl<R> ReadHalf<R> {
    pub fn new(inner: R) -> Self {
        Self(inner)
    }
}

impl<R: Read> Read for ReadHalf<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R> Write for ReadHalf<R> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The write-side counterpart of [`ReadHalf`]. Its `Read` side is never
/// exercised by [`protocol::MultiplexWriter`].
pub struct WriteHalf<W>(W);

impl<W> WriteHalf<W> {
    pub fn new(inner: W) -> Self {
        Self(inner)
    }
}

impl<W: Write> Write for WriteHalf<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W> Read for WriteHalf<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_half_delegates_reads_and_ignores_writes() {
        let mut half = ReadHalf::new(Cursor::new(b"payload".to_vec()));
        let mut buf = [0u8; 7];
        half.read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"payload");
        assert_eq!(half.write(b"ignored").expect("write is a no-op"), 7);
    }

    #[test]
    fn write_half_delegates_writes_and_reads_nothing() {
        let mut half = WriteHalf::new(Cursor::new(Vec::new()));
        half.write_all(b"payload").expect("write");
        half.flush().expect("flush");
        let mut buf = [0u8; 1];
        assert_eq!(half.read(&mut buf).expect("read is a no-op"), 0);
        assert_eq!(half.0.into_inner(), b"payload");
    }
}
