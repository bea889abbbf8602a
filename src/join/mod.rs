//! The join algorithms.
//!
//! Every algorithm takes a descriptor of the outer relation `R` and of the
//! inner relation `S` and returns a fresh store holding the concatenation
//! `r ‖ s` of every pair whose join keys are equal. The algorithms only
//! differ in how often they read `S`. Everything an algorithm opens is
//! owned by the call and released on every return path, a failed join
//! returns no store at all.
//!
//! The result store holds records of `len_r + len_s` bytes, so the storage
//! manager must accept records of that length. A [`HeapFileManager`] only
//! accepts records that fit in one of its pages; otherwise the join fails
//! with [`JoinError::ResourceOpenFailure`] naming [`Resource::ResultStore`]
//! before any pair is joined.
//!
//! [`HeapFileManager`]: crate::storage::HeapFileManager

pub use block::block_nested_loop;
pub use error::{JoinError, Resource, Result};
pub use index::{build_index, index_nested_loop, index_nested_loop_with};
pub use spec::{combine, JoinSide, JoinSpec, RecordLayout};
pub use tuple::tuple_nested_loop;

pub(crate) use spec::emit;

use crate::storage::{RecordStore, StorageManager};
use derive_more::Display;

mod block;
mod error;
mod index;
mod spec;
mod tuple;

/// Selects one of the join algorithms.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    #[display(fmt = "tuple-nested-loop")]
    TupleNestedLoop,
    #[display(fmt = "block-nested-loop({} bytes)", block_size)]
    BlockNestedLoop { block_size: usize },
    #[display(fmt = "index-nested-loop")]
    IndexNestedLoop,
}

impl Algorithm {
    /// Parses `tuple`, `block` or `index`.
    pub fn from_name(name: &str, block_size: usize) -> Option<Self> {
        match name {
            "tuple" => Some(Algorithm::TupleNestedLoop),
            "block" => Some(Algorithm::BlockNestedLoop { block_size }),
            "index" => Some(Algorithm::IndexNestedLoop),
            _ => None,
        }
    }

    pub fn join<M, R, S>(
        &self,
        manager: &M,
        outer: &JoinSpec<'_, R>,
        inner: &JoinSpec<'_, S>,
    ) -> Result<M::Store>
    where
        M: StorageManager + ?Sized,
        R: RecordStore + ?Sized,
        S: RecordStore + ?Sized,
    {
        match *self {
            Algorithm::TupleNestedLoop => tuple_nested_loop(manager, outer, inner),
            Algorithm::BlockNestedLoop { block_size } => {
                block_nested_loop(manager, outer, inner, block_size)
            }
            Algorithm::IndexNestedLoop => index_nested_loop(manager, outer, inner),
        }
    }
}
