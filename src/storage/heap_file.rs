use super::{RecordScan, RecordStore, Result, StorageError};
use crate::{
    memory_manager::MemoryManager,
    types::{PageNo, RecordId},
};
use derive_more::Display;
use std::cell::Cell;

pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// Page and record traffic of a [`HeapFile`].
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
#[display(
    fmt = "scans_opened={} pages_read={} records_read={} records_written={}",
    scans_opened,
    pages_read,
    records_read,
    records_written
)]
pub struct IoStats {
    pub scans_opened: u64,
    pub pages_read: u64,
    pub records_read: u64,
    pub records_written: u64,
}

/// An append-only file of fixed-length records.
///
/// Records are packed into pages of `page_size` bytes, the record in slot
/// `s` of page `p` starts at byte `p * page_size + s * record_len`. Unused
/// bytes at the end of every page stay zeroed.
pub struct HeapFile {
    mm: MemoryManager,
    record_len: usize,
    page_size: usize,
    records_per_page: usize,
    num_records: usize,
    capacity: Option<usize>,
    stats: Cell<IoStats>,
}

impl HeapFile {
    pub fn new(mut mm: MemoryManager, record_len: usize, page_size: usize) -> Result<Self> {
        if record_len == 0 || record_len > page_size {
            return Err(StorageError::InvalidRecordLen {
                record_len,
                page_size,
            });
        }
        mm.resize(0)?;
        Ok(Self {
            mm,
            record_len,
            page_size,
            records_per_page: page_size / record_len,
            num_records: 0,
            capacity: None,
            stats: Cell::new(IoStats::default()),
        })
    }

    pub fn in_memory(record_len: usize) -> Result<Self> {
        Self::new(MemoryManager::new_mem(0), record_len, DEFAULT_PAGE_SIZE)
    }

    /// Creates an in-memory file holding `records`.
    pub fn from_records<I, R>(record_len: usize, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut file = Self::in_memory(record_len)?;
        for record in records {
            file.insert_record(record.as_ref())?;
        }
        file.reset_stats();
        Ok(file)
    }

    /// Limits the number of records the file accepts.
    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn records_per_page(&self) -> usize {
        self.records_per_page
    }

    pub fn num_pages(&self) -> usize {
        (self.num_records + self.records_per_page - 1) / self.records_per_page
    }

    pub fn stats(&self) -> IoStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(IoStats::default());
    }

    fn update_stats<F: FnOnce(&mut IoStats)>(&self, f: F) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn rid_at(&self, index: usize) -> RecordId {
        RecordId::new(
            (index / self.records_per_page) as PageNo,
            (index % self.records_per_page) as u32,
        )
    }

    fn index_of(&self, rid: RecordId) -> Option<usize> {
        let slot_no = rid.slot_no as usize;
        if slot_no >= self.records_per_page {
            return None;
        }
        let index = rid.page_no as usize * self.records_per_page + slot_no;
        if index < self.num_records {
            Some(index)
        } else {
            None
        }
    }

    fn pos(&self, rid: RecordId) -> usize {
        rid.page_no as usize * self.page_size + rid.slot_no as usize * self.record_len
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len == self.record_len {
            Ok(())
        } else {
            Err(StorageError::RecordSizeMismatch {
                expected: self.record_len,
                actual: len,
            })
        }
    }

    fn read_at(&self, rid: RecordId, buf: &mut [u8]) -> Result<()> {
        let record = self
            .mm
            .read(self.pos(rid), self.record_len)
            .ok_or(StorageError::InvalidRecordId(rid))?;
        buf.copy_from_slice(record);
        Ok(())
    }

    /// Makes sure page `page_no` is backed by memory, doubling the buffer
    /// when growing.
    fn allocate_page(&mut self, page_no: usize) -> Result<()> {
        let needed = (page_no + 1) * self.page_size;
        if self.mm.len() < needed {
            self.mm.resize(std::cmp::max(needed, 2 * self.mm.len()))?;
        }
        Ok(())
    }
}

impl RecordStore for HeapFile {
    fn record_len(&self) -> usize {
        self.record_len
    }

    fn num_records(&self) -> usize {
        self.num_records
    }

    fn open_scan(&self) -> Result<Box<dyn RecordScan + '_>> {
        self.update_stats(|stats| stats.scans_opened += 1);
        Ok(Box::new(HeapScan {
            file: self,
            next: 0,
        }))
    }

    fn get_record(&self, rid: RecordId, buf: &mut [u8]) -> Result<()> {
        self.check_len(buf.len())?;
        if self.index_of(rid).is_none() {
            return Err(StorageError::InvalidRecordId(rid));
        }
        self.read_at(rid, buf)?;
        self.update_stats(|stats| {
            stats.pages_read += 1;
            stats.records_read += 1;
        });
        Ok(())
    }

    fn insert_record(&mut self, record: &[u8]) -> Result<RecordId> {
        self.check_len(record.len())?;
        if self.capacity.map_or(false, |cap| self.num_records >= cap) {
            return Err(StorageError::StoreFull);
        }
        let rid = self.rid_at(self.num_records);
        self.allocate_page(rid.page_no as usize)?;
        let pos = self.pos(rid);
        if !self.mm.write(pos, record) {
            return Err(StorageError::InvalidRecordId(rid));
        }
        self.num_records += 1;
        self.update_stats(|stats| stats.records_written += 1);
        Ok(rid)
    }
}

/// A sequential scan over a [`HeapFile`].
pub struct HeapScan<'a> {
    file: &'a HeapFile,
    next: usize,
}

impl<'a> RecordScan for HeapScan<'a> {
    fn next_record(&mut self, buf: &mut [u8]) -> Result<Option<RecordId>> {
        if self.next >= self.file.num_records {
            return Ok(None);
        }
        self.file.check_len(buf.len())?;
        let rid = self.file.rid_at(self.next);
        self.file.read_at(rid, buf)?;
        self.next += 1;
        self.file.update_stats(|stats| {
            if rid.slot_no == 0 {
                stats.pages_read += 1;
            }
            stats.records_read += 1;
        });
        Ok(Some(rid))
    }
}
