use super::{Result, SecondaryIndex};
use crate::types::{JoinKey, RecordId};
use rayon::slice::ParallelSliceMut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    key: JoinKey,
    rid: RecordId,
}

/// A bulk-loaded ordered index.
///
/// Entries are appended as they are inserted and sorted by key on the first
/// search after an out-of-order insert, so building the index from a scan
/// costs one sort. Searches binary-search the sorted entries.
#[derive(Debug)]
pub struct SortedIndex {
    entries: Vec<IndexEntry>,
    sorted: bool,
}

impl SortedIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            sorted: true,
        }
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.entries.par_sort_unstable_by_key(|e| e.key);
            self.sorted = true;
        }
    }
}

impl Default for SortedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondaryIndex for SortedIndex {
    fn insert(&mut self, key: JoinKey, rid: RecordId) -> Result<()> {
        if self.entries.last().map_or(false, |last| last.key > key) {
            self.sorted = false;
        }
        self.entries.push(IndexEntry { key, rid });
        Ok(())
    }

    fn range_search(
        &mut self,
        low: JoinKey,
        high: JoinKey,
    ) -> Result<Box<dyn Iterator<Item = RecordId> + '_>> {
        self.sort();
        let begin = self.entries.partition_point(|e| e.key < low);
        let end = std::cmp::max(begin, self.entries.partition_point(|e| e.key <= high));
        Ok(Box::new(self.entries[begin..end].iter().map(|e| e.rid)))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
