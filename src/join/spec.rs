use super::{JoinError, Result};
use crate::{
    storage::RecordStore,
    types::{JoinKey, KEY_SIZE},
};

/// Which side of a joined record carries the join attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Outer,
    Inner,
}

/// The layout of a fixed-length record with one integer join attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    len: usize,
    key_offset: usize,
}

impl RecordLayout {
    /// Fails unless the join key lies entirely inside a non-empty record.
    pub fn new(len: usize, key_offset: usize) -> Result<Self> {
        if len == 0 {
            return Err(JoinError::InvalidDescriptor(String::from(
                "record length must be positive",
            )));
        }
        if key_offset.checked_add(KEY_SIZE).map_or(true, |end| end > len) {
            return Err(JoinError::InvalidDescriptor(format!(
                "join key at offset {} does not fit a record of {} bytes",
                key_offset, len
            )));
        }
        Ok(Self { len, key_offset })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn key_offset(&self) -> usize {
        self.key_offset
    }

    /// Reads the join key of `record`.
    pub fn key(&self, record: &[u8]) -> Result<JoinKey> {
        match record.get(self.key_offset..self.key_offset + KEY_SIZE) {
            Some(b) if record.len() == self.len => {
                Ok(JoinKey::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            _ => Err(JoinError::InvalidDescriptor(format!(
                "record of {} bytes does not match layout of {} bytes",
                record.len(),
                self.len
            ))),
        }
    }

    /// The layout of records produced by joining `self` with `inner`, keyed
    /// on the join attribute of `side`.
    pub fn joined(&self, inner: &RecordLayout, side: JoinSide) -> RecordLayout {
        RecordLayout {
            len: self.len + inner.len,
            key_offset: match side {
                JoinSide::Outer => self.key_offset,
                JoinSide::Inner => self.len + inner.key_offset,
            },
        }
    }
}

/// Describes one relation taking part in a join.
pub struct JoinSpec<'a, S: ?Sized> {
    store: &'a S,
    layout: RecordLayout,
    name: Option<String>,
    num_attrs: Option<usize>,
}

impl<'a, S: RecordStore + ?Sized> JoinSpec<'a, S> {
    pub fn new(store: &'a S, layout: RecordLayout) -> Self {
        Self {
            store,
            layout,
            name: None,
            num_attrs: None,
        }
    }

    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_num_attrs(mut self, num_attrs: usize) -> Self {
        self.num_attrs = Some(num_attrs);
        self
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn record_len(&self) -> usize {
        self.layout.len
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn num_attrs(&self) -> Option<usize> {
        self.num_attrs
    }

    pub(crate) fn display_name(&self) -> &str {
        self.name().unwrap_or("<unnamed>")
    }

    pub fn key(&self, record: &[u8]) -> Result<JoinKey> {
        self.layout.key(record)
    }

    /// Checks the layout against the store it describes.
    pub fn validate(&self) -> Result<()> {
        if self.store.record_len() == self.layout.len {
            Ok(())
        } else {
            Err(JoinError::InvalidDescriptor(format!(
                "relation {} stores records of {} bytes, layout says {}",
                self.display_name(),
                self.store.record_len(),
                self.layout.len
            )))
        }
    }
}

/// Writes `outer` followed by `inner` into `joined`.
///
/// `joined` must be exactly `outer.len() + inner.len()` bytes long.
pub fn combine(joined: &mut [u8], outer: &[u8], inner: &[u8]) {
    debug_assert_eq!(joined.len(), outer.len() + inner.len());
    let (head, tail) = joined.split_at_mut(outer.len());
    head.copy_from_slice(outer);
    tail.copy_from_slice(inner);
}

/// Combines one matching pair and stores it in `result`.
pub(crate) fn emit<T: RecordStore + ?Sized>(
    result: &mut T,
    joined: &mut [u8],
    outer: &[u8],
    inner: &[u8],
) -> Result<()> {
    combine(joined, outer, inner);
    result.insert_record(joined)?;
    Ok(())
}
