use super::{HeapFile, Result, SecondaryIndex, SortedIndex, StorageManager, DEFAULT_PAGE_SIZE};
use crate::memory_manager::MemoryManager;
use std::path::PathBuf;

/// Where the stores created by a [`HeapFileManager`] keep their records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    /// Process memory.
    Mem,
    /// A memory mapped temporary file, optionally inside the given
    /// directory. The file is deleted when the store is dropped.
    Mmap(Option<PathBuf>),
}

impl StoreType {
    pub fn new(store_type: &str, directory: Option<&str>) -> Option<Self> {
        match store_type {
            "mem" => Some(StoreType::Mem),
            "mmap" => Some(StoreType::Mmap(directory.map(PathBuf::from))),
            _ => None,
        }
    }

    fn create_mm(&self) -> Result<MemoryManager> {
        Ok(match self {
            StoreType::Mem => MemoryManager::new_mem(0),
            StoreType::Mmap(directory) => MemoryManager::new_temp_mmap(directory.as_ref())?,
        })
    }
}

/// Creates [`HeapFile`] stores and [`SortedIndex`] indexes.
#[derive(Debug, Clone)]
pub struct HeapFileManager {
    store_type: StoreType,
    page_size: usize,
    capacity: Option<usize>,
}

impl HeapFileManager {
    pub fn new(store_type: StoreType) -> Self {
        Self {
            store_type,
            page_size: DEFAULT_PAGE_SIZE,
            capacity: None,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Limits the number of records each created store accepts.
    pub fn capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn store_type(&self) -> &StoreType {
        &self.store_type
    }
}

impl Default for HeapFileManager {
    fn default() -> Self {
        Self::new(StoreType::Mem)
    }
}

impl StorageManager for HeapFileManager {
    type Store = HeapFile;

    fn create_store(&self, record_len: usize) -> Result<HeapFile> {
        Ok(
            HeapFile::new(self.store_type.create_mm()?, record_len, self.page_size)?
                .with_capacity(self.capacity),
        )
    }

    fn create_index(&self) -> Result<Box<dyn SecondaryIndex>> {
        Ok(Box::new(SortedIndex::new()))
    }
}
