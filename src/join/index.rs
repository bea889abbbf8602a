use super::{emit, JoinError, JoinSpec, Resource, Result};
use crate::storage::{RecordStore, SecondaryIndex, StorageManager};
use log::{debug, info};

/// Builds an index over the join attribute of `inner`.
///
/// The index holds one entry per inner record, duplicate keys included.
pub fn build_index<M, S>(manager: &M, inner: &JoinSpec<'_, S>) -> Result<Box<dyn SecondaryIndex>>
where
    M: StorageManager + ?Sized,
    S: RecordStore + ?Sized,
{
    inner.validate()?;
    let mut index = manager
        .create_index()
        .map_err(JoinError::open_failure(Resource::Index))?;
    let mut rec_s = vec![0; inner.record_len()];
    let mut scan_s = inner
        .store()
        .open_scan()
        .map_err(JoinError::open_failure(Resource::InnerScan))?;
    while let Some(rid) = scan_s.next_record(&mut rec_s)? {
        index.insert(inner.key(&rec_s)?, rid)?;
    }
    debug!(
        "built index on {} with {} entries",
        inner.display_name(),
        index.len()
    );
    Ok(index)
}

/// Joins `outer` with `inner` by probing a transient index on `inner`.
///
/// The index is built from one scan of `S`, then every outer record runs
/// one equality search and fetches its matches by handle. The index is
/// dropped before returning.
pub fn index_nested_loop<M, R, S>(
    manager: &M,
    outer: &JoinSpec<'_, R>,
    inner: &JoinSpec<'_, S>,
) -> Result<M::Store>
where
    M: StorageManager + ?Sized,
    R: RecordStore + ?Sized,
    S: RecordStore + ?Sized,
{
    outer.validate()?;
    let mut index = build_index(manager, inner)?;
    index_nested_loop_with(manager, outer, inner, index.as_mut())
}

/// Joins `outer` with `inner` by probing `index`, which must have been built
/// by [`build_index`] over `inner` and is left intact for reuse.
///
/// Fails with [`JoinError::InvalidDescriptor`] if the index size differs
/// from `inner`, or if an entry leads to an inner record with another key.
pub fn index_nested_loop_with<M, R, S>(
    manager: &M,
    outer: &JoinSpec<'_, R>,
    inner: &JoinSpec<'_, S>,
    index: &mut dyn SecondaryIndex,
) -> Result<M::Store>
where
    M: StorageManager + ?Sized,
    R: RecordStore + ?Sized,
    S: RecordStore + ?Sized,
{
    outer.validate()?;
    inner.validate()?;
    if index.len() != inner.store().num_records() {
        return Err(JoinError::InvalidDescriptor(format!(
            "index holds {} entries but {} has {} records",
            index.len(),
            inner.display_name(),
            inner.store().num_records()
        )));
    }
    info!(
        "index-nested-loop join: {} ({} records) with {} ({} index entries)",
        outer.display_name(),
        outer.store().num_records(),
        inner.display_name(),
        index.len()
    );
    let (len_r, len_s) = (outer.record_len(), inner.record_len());
    let mut joined = manager
        .create_store(len_r + len_s)
        .map_err(JoinError::open_failure(Resource::ResultStore))?;
    let (mut rec_r, mut rec_s) = (vec![0; len_r], vec![0; len_s]);
    let mut rec_joined = vec![0; len_r + len_s];
    let mut scan_r = outer
        .store()
        .open_scan()
        .map_err(JoinError::open_failure(Resource::OuterScan))?;
    while scan_r.next_record(&mut rec_r)?.is_some() {
        let key_r = outer.key(&rec_r)?;
        for rid in index.equality_search(key_r)? {
            inner.store().get_record(rid, &mut rec_s)?;
            let key_s = inner.key(&rec_s)?;
            if key_s != key_r {
                return Err(JoinError::InvalidDescriptor(format!(
                    "index maps key {} to {} in {}, which holds key {}",
                    key_r,
                    rid,
                    inner.display_name(),
                    key_s
                )));
            }
            emit(&mut joined, &mut rec_joined, &rec_r, &rec_s)?;
        }
    }
    info!("index-nested-loop join: {} records", joined.num_records());
    Ok(joined)
}
