use super::{emit, JoinError, JoinSpec, Resource, Result};
use crate::storage::{RecordStore, StorageManager};
use log::info;

/// Joins `outer` with `inner` one outer record at a time.
///
/// The inner relation is scanned once per outer record, so this costs
/// `|R|` scans of `S` plus one scan of `R`.
pub fn tuple_nested_loop<M, R, S>(
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
    inner.validate()?;
    info!(
        "tuple-nested-loop join: {} ({} records) with {} ({} records)",
        outer.display_name(),
        outer.store().num_records(),
        inner.display_name(),
        inner.store().num_records()
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
        let mut scan_s = inner
            .store()
            .open_scan()
            .map_err(JoinError::open_failure(Resource::InnerScan))?;
        while scan_s.next_record(&mut rec_s)?.is_some() {
            if key_r == inner.key(&rec_s)? {
                emit(&mut joined, &mut rec_joined, &rec_r, &rec_s)?;
            }
        }
    }
    info!("tuple-nested-loop join: {} records", joined.num_records());
    Ok(joined)
}
