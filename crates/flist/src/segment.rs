use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::entry::FileListEntry;
use crate::error::FileListError;

/// Directory index carried by the file list's first segment. Smaller than
/// any real global index, and paired with a `None` directory.
pub const ROOT_DIRECTORY_INDEX: i32 = -1;

/// A contiguous run of the file list discovered together.
///
/// Every entry in a segment is assigned a dense global index starting at
/// the segment's `start_index`; a later segment's indices always start
/// above this one's. `remaining` counts live entries and reaches zero once
/// every index in the segment has been resolved by [`Segment::remove`].
#[derive(Debug)]
pub struct Segment {
    directory_index: i32,
    directory: Option<FileListEntry>,
    start_index: i32,
    len: usize,
    entries: FxHashMap<i32, FileListEntry>,
    remaining: usize,
}

impl Segment {
    fn new(
        directory_index: i32,
        directory: Option<FileListEntry>,
        start_index: i32,
        files: Vec<FileListEntry>,
    ) -> Self {
        let len = files.len();
        let entries = files
            .into_iter()
            .enumerate()
            .map(|(offset, entry)| (start_index + offset as i32, entry))
            .collect();
        Self { directory_index, directory, start_index, len, entries, remaining: len }
    }

    #[must_use]
    pub fn directory_index(&self) -> i32 {
        self.directory_index
    }

    #[must_use]
    pub fn directory(&self) -> Option<&FileListEntry> {
        self.directory.as_ref()
    }

    #[must_use]
    pub fn start_index(&self) -> i32 {
        self.start_index
    }

    /// The last global index this segment ever held, even after some of
    /// its entries have been removed. Empty for a segment with no entries.
    #[must_use]
    pub fn end_index(&self) -> i32 {
        self.start_index + self.len as i32 - 1
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn contains_index(&self, index: i32) -> bool {
        self.len > 0 && index >= self.start_index && index <= self.end_index()
    }

    #[must_use]
    pub fn get(&self, index: i32) -> Option<&FileListEntry> {
        self.entries.get(&index)
    }

    /// The segment's currently live entries, ordered by ascending index.
    #[must_use]
    pub fn entry_set(&self) -> Vec<(i32, &FileListEntry)> {
        let mut items: Vec<_> = self.entries.iter().map(|(&index, entry)| (index, entry)).collect();
        items.sort_unstable_by_key(|(index, _)| *index);
        items
    }

    /// Resolves `index`, dropping its entry and decrementing `remaining`.
    pub fn remove(&mut self, index: i32) -> Result<(), FileListError> {
        if self.entries.remove(&index).is_none() {
            return Err(FileListError::UnknownIndex(index));
        }
        self.remaining -= 1;
        Ok(())
    }

    pub fn remove_all(&mut self, indices: &[i32]) -> Result<(), FileListError> {
        for &index in indices {
            self.remove(index)?;
        }
        Ok(())
    }
}

/// The segmented, ordered collection backing a transfer's file list.
///
/// Segments queue in discovery order. Only the first segment may ever be
/// removed, and only once every one of its entries has been resolved —
/// this keeps the `DONE` index the generator/receiver exchange in sync
/// with which segment is actually finished.
#[derive(Debug, Default)]
pub struct FileList {
    segments: VecDeque<Segment>,
    next_index: i32,
}

impl FileList {
    #[must_use]
    pub fn new() -> Self {
        Self { segments: VecDeque::new(), next_index: 0 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Appends a new segment covering `entries`, assigning it the next
    /// block of global indices, and returns the index the segment starts
    /// at. `directory` is `None` only for the transfer's initial segment;
    /// every later segment is produced by recursing into a directory entry
    /// (its own global index and [`FileListEntry`]) discovered earlier.
    pub fn append_segment(
        &mut self,
        directory: Option<(i32, FileListEntry)>,
        entries: Vec<FileListEntry>,
    ) -> i32 {
        let start_index = self.next_index;
        self.next_index += entries.len() as i32;
        let (directory_index, directory_entry) = match directory {
            Some((index, entry)) => (index, Some(entry)),
            None => (ROOT_DIRECTORY_INDEX, None),
        };
        self.segments.push_back(Segment::new(directory_index, directory_entry, start_index, entries));
        start_index
    }

    #[must_use]
    pub fn get_segment_with(&self, index: i32) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.contains_index(index))
    }

    pub fn get_segment_with_mut(&mut self, index: i32) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|segment| segment.contains_index(index))
    }

    /// Removes and returns the file list's first segment.
    ///
    /// Fails if there is no first segment, or if it still has entries
    /// outstanding.
    pub fn delete_first_segment(&mut self) -> Result<Segment, FileListError> {
        match self.segments.front() {
            None => Err(FileListError::NoSegments),
            Some(segment) if !segment.is_finished() => {
                Err(FileListError::SegmentNotFinished { remaining: segment.remaining() })
            }
            Some(_) => Ok(self.segments.pop_front().expect("front segment just checked present")),
        }
    }
}
