use std::io::{Read, Write};

use protocol::{BufferedChannel, MultiplexReader, MultiplexWriter};

use crate::split::{ReadHalf, WriteHalf};

/// A session's paired read/write transport halves.
///
/// Built from two independently owned byte sources rather than one
/// combined stream: this covers a TCP socket (after `try_clone`), a stdio
/// pipe pair (`Stdin`/`Stdout`), and the in-process [`crate::pipe::pipe_pair`]
/// uniformly, with no splitting trait required.
pub struct FrameTransport<R, W> {
    pub reader: MultiplexReader<ReadHalf<R>>,
    pub writer: MultiplexWriter<WriteHalf<W>>,
}

impl<R, W> FrameTransport<R, W>
where
    R: Read,
    W: Write,
{
    pub fn new(read: R, write: W) -> Self {
        Self {
            reader: MultiplexReader::new(BufferedChannel::new(ReadHalf::new(read))),
            writer: MultiplexWriter::new(BufferedChannel::new(WriteHalf::new(write))),
        }
    }

    pub fn into_halves(self) -> (MultiplexReader<ReadHalf<R>>, MultiplexWriter<WriteHalf<W>>) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::pipe_pair;
    use protocol::{MessageCode, NullHandler};

    #[test]
    fn data_written_on_one_transport_is_read_back_on_the_other() {
        let ((reader_a, writer_a), (reader_b, writer_b)) = pipe_pair();
        let mut local = FrameTransport::new(reader_a, writer_a);
        let mut remote = FrameTransport::new(reader_b, writer_b);

        local.writer.write_data(b"payload").expect("write_data");
        local.writer.flush().expect("flush");

        let mut handler = NullHandler;
        let mut out = [0u8; 7];
        remote
            .reader
            .read_data(&mut handler, &mut out)
            .expect("read_data");
        assert_eq!(&out, b"payload");

        local.writer.write_message(MessageCode::Done, &[]).expect("write_message");
        local.writer.flush().expect("flush");
        let (code, _) = remote.reader.read_frame().expect("read_frame");
        assert_eq!(code, MessageCode::Done);
    }
}
