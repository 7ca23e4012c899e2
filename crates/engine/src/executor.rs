//! Task executor: wires a Generator, Sender, and Receiver into one
//! in-process local-copy session over two internal pipes.

use std::path::{Path, PathBuf};

use rcore::FileAttributeManager;
use flist::FileListEntry;
use protocol::BufferedChannel;
use rsync_io::combined::Combined;
use rsync_io::{pipe_pair, FrameTransport};

use crate::error::Result;
use crate::generator::Generator;
use crate::options::{FileSelection, GeneratorOptions, ReceiverOptions, SenderOptions};
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::uplink::ChannelUplink;

/// Options bundle for one [`run_local_copy`] invocation.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorOptions {
    pub generator: GeneratorOptions,
    pub sender: SenderOptions,
    pub receiver: ReceiverOptions,
    pub checksum_seed: i32,
}

/// Copies `source_root` onto `dest_root` by running the Generator, Sender,
/// and Receiver roles concurrently, connected by two in-process pipes: one
/// plain byte channel carrying the Generator's itemize/checksum requests to
/// the Sender, and one multiplexed transport carrying the Sender's delta
/// stream (and the Receiver's acknowledgements) to and from the Receiver.
///
/// `options.generator.file_selection` trims the walk afterward: `Single`
/// keeps the root and its immediate children only, matching non-recursive
/// (no `-r`) invocations that never descend into subdirectories.
///
/// Returns the source-side file list that was walked, so a caller can
/// render `--stats`-style totals against it.
pub fn run_local_copy(
    source_root: &Path,
    dest_root: &Path,
    source_attrs: &dyn FileAttributeManager,
    dest_attrs: &dyn FileAttributeManager,
    options: ExecutorOptions,
) -> Result<Vec<FileListEntry>> {
    let mut entries = flist::build_file_list(source_root, source_attrs)?;
    if options.generator.file_selection == FileSelection::Single {
        entries.retain(|entry| entry.is_root() || entry.depth() <= 1);
    }

    let ((gen_read, gen_write), (send_read, send_write)) = pipe_pair();
    let mut generator_channel = BufferedChannel::new(Combined::new(gen_read, gen_write));
    let mut sender_request_channel = BufferedChannel::new(Combined::new(send_read, send_write));

    let ((peer_a_read, peer_a_write), (peer_b_read, peer_b_write)) = pipe_pair();
    let mut sender_peer = FrameTransport::new(peer_a_read, peer_a_write);
    let mut receiver_peer = FrameTransport::new(peer_b_read, peer_b_write);

    let (uplink, uplink_rx) = ChannelUplink::pair();

    let dest_root: PathBuf = dest_root.to_path_buf();
    let source_root: PathBuf = source_root.to_path_buf();

    let (generator_result, sender_result, receiver_result) = std::thread::scope(|scope| {
        let generator_handle = scope.spawn(|| {
            let mut generator = Generator::new(dest_root.clone(), dest_attrs, options.generator, options.checksum_seed, uplink_rx);
            generator.run(&mut generator_channel, &entries)
        });
        let sender_handle = scope.spawn(|| {
            let mut sender = Sender::new(source_root.clone(), &entries, options.sender, options.checksum_seed);
            sender.run(&mut sender_request_channel, &mut sender_peer)
        });
        let receiver_handle = scope.spawn(|| {
            let mut receiver = Receiver::new(dest_root.clone(), dest_attrs, &entries, options.receiver, options.checksum_seed, &uplink);
            receiver.run(&mut receiver_peer)
        });

        (
            generator_handle.join().expect("generator thread panicked"),
            sender_handle.join().expect("sender thread panicked"),
            receiver_handle.join().expect("receiver thread panicked"),
        )
    });

    generator_result?;
    sender_result?;
    receiver_result?;
    Ok(entries)
}
