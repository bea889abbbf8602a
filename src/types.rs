//! Various types shared by the storage layer and the join algorithms.

use derive_more::Display;
use std::mem::size_of;

/// The join attribute type.
pub type JoinKey = i32;

/// Number of bytes a [`JoinKey`] occupies inside a record.
pub const KEY_SIZE: usize = size_of::<JoinKey>();

/// The page number type.
pub type PageNo = u32;

/// Identifies a record inside a record store.
///
/// Handles are assigned by the store on insertion and are only meaningful
/// to the store that issued them.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(fmt = "({}, {})", page_no, slot_no)]
pub struct RecordId {
    pub page_no: PageNo,
    pub slot_no: u32,
}

impl RecordId {
    pub fn new(page_no: PageNo, slot_no: u32) -> Self {
        Self { page_no, slot_no }
    }
}

/// Encodes integers as a record of consecutive little-endian join keys.
pub fn encode_ints(values: &[JoinKey]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes a record of consecutive little-endian join keys.
///
/// Trailing bytes that do not form a whole integer are ignored.
pub fn decode_ints(record: &[u8]) -> Vec<JoinKey> {
    record
        .chunks_exact(KEY_SIZE)
        .map(|b| JoinKey::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
