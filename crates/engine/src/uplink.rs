//! Receiver-to-Generator drop notifications for files the Sender could not
//! read.
//!
//! The Sender and Receiver are connected to each other over the multiplexed
//! transport, but the Generator only ever talks to the Sender. When the
//! Sender hits `NO_SEND` it still has to tell the Receiver (over the
//! transport it shares with it) and the Generator (which it has no direct
//! line to) to stop waiting on that file. In local-copy mode the Generator
//! and Receiver run in the same process, so the Receiver relays the
//! notification back to the Generator through an in-process channel instead
//! of a second round trip over the wire.

use crossbeam_channel::{Receiver, Sender};

/// One notification a [`ReceiverUplink`] can carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UplinkMessage {
    /// Drop file list index `.0`: the Sender could not read it.
    PurgeFile(i32),
    /// The Generator's current segment has no more deferred jobs to flush
    /// past index `.0`.
    PruneSegment(u64),
}

/// How the Receiver reports back to the Generator. A trait rather than a
/// bare channel so tests can substitute a recording stub.
pub trait ReceiverUplink: Send {
    fn purge_file(&self, index: i32);
    fn prune_segment(&self, segment_id: u64);
}

/// A [`ReceiverUplink`] backed by a `crossbeam_channel`, for the in-process
/// local-copy executor.
pub struct ChannelUplink {
    sender: Sender<UplinkMessage>,
}

impl ChannelUplink {
    #[must_use]
    pub fn new(sender: Sender<UplinkMessage>) -> Self {
        Self { sender }
    }

    /// Builds a connected `(ChannelUplink, Receiver<UplinkMessage>)` pair.
    #[must_use]
    pub fn pair() -> (Self, Receiver<UplinkMessage>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl ReceiverUplink for ChannelUplink {
    fn purge_file(&self, index: i32) {
        // The Generator may already have exited (e.g. the transfer was
        // cancelled); a closed channel is not this call's problem.
        let _ = self.sender.send(UplinkMessage::PurgeFile(index));
    }

    fn prune_segment(&self, segment_id: u64) {
        let _ = self.sender.send(UplinkMessage::PruneSegment(segment_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_file_is_delivered_to_the_paired_receiver() {
        let (uplink, rx) = ChannelUplink::pair();
        uplink.purge_file(7);
        assert_eq!(rx.try_recv().unwrap(), UplinkMessage::PurgeFile(7));
    }

    #[test]
    fn send_after_receiver_is_dropped_does_not_panic() {
        let (uplink, rx) = ChannelUplink::pair();
        drop(rx);
        uplink.purge_file(1);
        uplink.prune_segment(0);
    }
}
