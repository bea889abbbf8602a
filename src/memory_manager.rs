use memmap::MmapMut;
use std::fs::File;
use std::io;
use std::path::Path;

/// A memory mapped file.
pub struct MmapFile {
    file: File,
    mmap: MmapMut,
    len: u64,
}

impl MmapFile {
    pub fn from_file(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        let mmap = if len == 0 {
            MmapMut::map_anon(1)?
        } else {
            unsafe { MmapMut::map_mut(&file)? }
        };
        Ok(Self { file, mmap, len })
    }

    /// Creates an empty memory mapped file which is deleted once dropped.
    pub fn temp<P: AsRef<Path>>(directory: Option<P>) -> io::Result<Self> {
        let file = match directory {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        Self::from_file(file)
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn resize(&mut self, new_len: usize) -> io::Result<()> {
        self.len = new_len as u64;
        self.mmap = MmapMut::map_anon(1)?;
        self.file.set_len(self.len)?;
        if new_len != 0 {
            self.mmap = unsafe { MmapMut::map_mut(&self.file)? }
        }
        Ok(())
    }

    fn as_slice(&self) -> &[u8] {
        &self.mmap[..self.len()]
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.mmap[..len]
    }
}

/// A memory manager to hide the underlying type of the memory buffer.
pub enum MemoryManager {
    /// A memory buffer.
    Mem(Vec<u8>),
    /// A memory mapped buffer.
    Mmap(MmapFile),
}

impl MemoryManager {
    pub fn new_mem(size: usize) -> Self {
        MemoryManager::Mem(vec![0; size])
    }

    pub fn new_temp_mmap<P: AsRef<Path>>(directory: Option<P>) -> io::Result<Self> {
        Ok(MemoryManager::Mmap(MmapFile::temp(directory)?))
    }

    pub fn len(&self) -> usize {
        match self {
            MemoryManager::Mem(vec) => vec.len(),
            MemoryManager::Mmap(mmapfile) => mmapfile.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows or shrinks the buffer, new bytes are zeroed.
    pub fn resize(&mut self, new_len: usize) -> io::Result<()> {
        match self {
            MemoryManager::Mem(vec) => vec.resize(new_len, 0),
            MemoryManager::Mmap(mmapfile) => mmapfile.resize(new_len)?,
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            MemoryManager::Mem(vec) => vec.as_slice(),
            MemoryManager::Mmap(mmapfile) => mmapfile.as_slice(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            MemoryManager::Mem(vec) => vec.as_mut_slice(),
            MemoryManager::Mmap(mmapfile) => mmapfile.as_mut_slice(),
        }
    }

    /// Returns `len` bytes starting at `pos`, or `None` if out of bounds.
    pub fn read(&self, pos: usize, len: usize) -> Option<&[u8]> {
        self.as_slice().get(pos..pos.checked_add(len)?)
    }

    /// Copies `data` to `pos`, returns `false` if it does not fit.
    pub fn write(&mut self, pos: usize, data: &[u8]) -> bool {
        let end = match pos.checked_add(data.len()) {
            Some(end) => end,
            None => return false,
        };
        match self.as_mut_slice().get_mut(pos..end) {
            Some(dst) => {
                dst.copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}
