//! Record stores and secondary indexes the join algorithms run on.
//!
//! The join algorithms only see the traits defined here. [`HeapFile`],
//! [`SortedIndex`] and [`HeapFileManager`] are the implementations shipped
//! with the crate.

pub use error::{Result, StorageError};
pub use heap_file::{HeapFile, HeapScan, IoStats, DEFAULT_PAGE_SIZE};
pub use manager::{HeapFileManager, StoreType};
pub use sorted_index::SortedIndex;

use crate::types::{JoinKey, RecordId};

mod error;
mod heap_file;
mod manager;
mod sorted_index;

/// A file of fixed-length records.
pub trait RecordStore {
    /// Length in bytes of every record in the store.
    fn record_len(&self) -> usize;

    fn num_records(&self) -> usize;

    /// Opens a sequential scan, which is closed when dropped.
    fn open_scan(&self) -> Result<Box<dyn RecordScan + '_>>;

    /// Copies the record identified by `rid` into `buf`.
    fn get_record(&self, rid: RecordId, buf: &mut [u8]) -> Result<()>;

    fn insert_record(&mut self, record: &[u8]) -> Result<RecordId>;
}

/// A sequential scan over a [`RecordStore`].
pub trait RecordScan {
    /// Copies the next record into `buf` and returns its handle, or `None`
    /// at the end of the scan.
    fn next_record(&mut self, buf: &mut [u8]) -> Result<Option<RecordId>>;
}

/// An ordered index from join keys to record handles.
///
/// Duplicate keys are kept. The index is destroyed when dropped.
pub trait SecondaryIndex {
    fn insert(&mut self, key: JoinKey, rid: RecordId) -> Result<()>;

    /// Yields the handles of all entries with `low <= key <= high`.
    fn range_search(
        &mut self,
        low: JoinKey,
        high: JoinKey,
    ) -> Result<Box<dyn Iterator<Item = RecordId> + '_>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn equality_search(&mut self, key: JoinKey) -> Result<Box<dyn Iterator<Item = RecordId> + '_>> {
        self.range_search(key, key)
    }
}

/// Creates the stores and indexes a join needs.
pub trait StorageManager {
    type Store: RecordStore;

    /// Creates an empty store for records of `record_len` bytes.
    fn create_store(&self, record_len: usize) -> Result<Self::Store>;

    fn create_index(&self) -> Result<Box<dyn SecondaryIndex>>;
}

/// Reads every record of `store` in scan order.
pub fn collect_records<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<Vec<u8>>> {
    let mut records = Vec::with_capacity(store.num_records());
    let mut buf = vec![0; store.record_len()];
    let mut scan = store.open_scan()?;
    while scan.next_record(&mut buf)?.is_some() {
        records.push(buf.clone());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encode_ints;

    #[test]
    fn test_collect_records() {
        let rows = vec![encode_ints(&[1, 2]), encode_ints(&[3, 4]), encode_ints(&[5, 6])];
        let file = HeapFile::from_records(8, &rows).unwrap();
        assert_eq!(collect_records(&file).unwrap(), rows);
        let empty = HeapFile::in_memory(8).unwrap();
        assert!(collect_records(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_equality_search_default() {
        let mut index: Box<dyn SecondaryIndex> = Box::new(SortedIndex::new());
        assert!(index.is_empty());
        index.insert(3, RecordId::new(0, 0)).unwrap();
        index.insert(1, RecordId::new(0, 1)).unwrap();
        index.insert(3, RecordId::new(0, 2)).unwrap();
        let mut rids: Vec<_> = index.equality_search(3).unwrap().collect();
        rids.sort();
        assert_eq!(rids, vec![RecordId::new(0, 0), RecordId::new(0, 2)]);
    }
}
