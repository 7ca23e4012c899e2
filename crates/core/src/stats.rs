use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Session statistics, updated only by the role that owns them and read only
/// after the [Task Executor](crate) reports completion.
///
/// Each field is an independent atomic rather than a struct behind a mutex:
/// the Generator, Sender, and Receiver update disjoint subsets of the
/// counters and never need a consistent joint snapshot mid-transfer.
#[derive(Default)]
pub struct TransferStats {
    pub num_files: AtomicU64,
    pub num_transferred_files: AtomicU64,
    pub total_file_list_size: AtomicU64,
    pub total_transferred_size: AtomicU64,
    pub total_literal_size: AtomicU64,
    pub total_matched_size: AtomicU64,
    pub total_file_size: AtomicU64,
    pub total_bytes_read: AtomicU64,
    pub total_bytes_written: AtomicU64,
    /// Millis spent building the file list, end to end.
    pub file_list_build_time_ms: AtomicU64,
    /// Millis spent transferring the file list itself over the wire.
    pub file_list_transfer_time_ms: AtomicU64,
}

impl TransferStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, size: u64) {
        self.num_files.fetch_add(1, Ordering::Relaxed);
        self.total_file_size.fetch_add(size, Ordering::Relaxed);
    }

    pub fn add_transferred(&self, literal: u64, matched: u64) {
        self.num_transferred_files.fetch_add(1, Ordering::Relaxed);
        self.total_literal_size.fetch_add(literal, Ordering::Relaxed);
        self.total_matched_size.fetch_add(matched, Ordering::Relaxed);
        self.total_transferred_size
            .fetch_add(literal + matched, Ordering::Relaxed);
    }

    pub fn add_bytes_read(&self, n: u64) {
        self.total_bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_bytes_written(&self, n: u64) {
        self.total_bytes_written.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_file_list_build_time(&self, elapsed: Duration) {
        self.file_list_build_time_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn set_file_list_transfer_time(&self, elapsed: Duration) {
        self.file_list_transfer_time_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            num_files: self.num_files.load(Ordering::Relaxed),
            num_transferred_files: self.num_transferred_files.load(Ordering::Relaxed),
            total_file_list_size: self.total_file_list_size.load(Ordering::Relaxed),
            total_transferred_size: self.total_transferred_size.load(Ordering::Relaxed),
            total_literal_size: self.total_literal_size.load(Ordering::Relaxed),
            total_matched_size: self.total_matched_size.load(Ordering::Relaxed),
            total_file_size: self.total_file_size.load(Ordering::Relaxed),
            total_bytes_read: self.total_bytes_read.load(Ordering::Relaxed),
            total_bytes_written: self.total_bytes_written.load(Ordering::Relaxed),
            file_list_build_time_ms: self.file_list_build_time_ms.load(Ordering::Relaxed),
            file_list_transfer_time_ms: self.file_list_transfer_time_ms.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time, non-atomic copy of [`TransferStats`] suitable for
/// rendering (`--stats`) once the executor has reported completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub num_files: u64,
    pub num_transferred_files: u64,
    pub total_file_list_size: u64,
    pub total_transferred_size: u64,
    pub total_literal_size: u64,
    pub total_matched_size: u64,
    pub total_file_size: u64,
    pub total_bytes_read: u64,
    pub total_bytes_written: u64,
    pub file_list_build_time_ms: u64,
    pub file_list_transfer_time_ms: u64,
}

/// Renders the `--stats` table in the same field order upstream rsync uses.
#[must_use]
pub fn format_stats(stats: &StatsSnapshot, elapsed: Duration) -> String {
    format!(
        "Number of files: {}\n\
         Number of files transferred: {}\n\
         Total file size: {} bytes\n\
         Total transferred file size: {} bytes\n\
         Literal data: {} bytes\n\
         Matched data: {} bytes\n\
         File list build time: {} ms\n\
         File list transfer time: {} ms\n\
         Total bytes sent: {}\n\
         Total bytes received: {}\n\
         Elapsed: {:.3} seconds\n",
        stats.num_files,
        stats.num_transferred_files,
        stats.total_file_size,
        stats.total_transferred_size,
        stats.total_literal_size,
        stats.total_matched_size,
        stats.file_list_build_time_ms,
        stats.file_list_transfer_time_ms,
        stats.total_bytes_written,
        stats.total_bytes_read,
        elapsed.as_secs_f64(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_transferred_updates_totals() {
        let stats = TransferStats::new();
        stats.add_file(100);
        stats.add_transferred(40, 60);
        let snap = stats.snapshot();
        assert_eq!(snap.total_literal_size, 40);
        assert_eq!(snap.total_matched_size, 60);
        assert_eq!(snap.total_transferred_size, 100);
        assert_eq!(snap.num_transferred_files, 1);
    }

    #[test]
    fn identical_file_reports_zero_transfer() {
        let stats = TransferStats::new();
        stats.add_file(557);
        let snap = stats.snapshot();
        assert_eq!(snap.num_files, 1);
        assert_eq!(snap.num_transferred_files, 0);
        assert_eq!(snap.total_literal_size, 0);
        assert_eq!(snap.total_matched_size, 0);
    }

    #[test]
    fn file_list_timing_round_trips_through_snapshot() {
        let stats = TransferStats::new();
        stats.set_file_list_build_time(Duration::from_millis(12));
        stats.set_file_list_transfer_time(Duration::from_millis(3));
        let snap = stats.snapshot();
        assert_eq!(snap.file_list_build_time_ms, 12);
        assert_eq!(snap.file_list_transfer_time_ms, 3);
    }

    #[test]
    fn format_stats_includes_all_counters() {
        let stats = TransferStats::new();
        stats.add_file(2048);
        stats.add_transferred(2048, 0);
        let rendered = format_stats(&stats.snapshot(), Duration::from_millis(5));
        assert!(rendered.contains("Number of files: 1"));
        assert!(rendered.contains("Literal data: 2048 bytes"));
    }
}
