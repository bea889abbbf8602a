use super::{emit, JoinError, JoinSpec, Resource, Result};
use crate::storage::{RecordScan, RecordStore, StorageManager};
use log::{debug, info};

/// Joins `outer` with `inner` a block of outer records at a time.
///
/// A block holds as many outer records as fit in `block_size` bytes. The
/// inner relation is scanned once per block rather than once per outer
/// record, so this costs `ceil(|R| / records_per_block)` scans of `S` plus
/// one scan of `R`.
pub fn block_nested_loop<M, R, S>(
    manager: &M,
    outer: &JoinSpec<'_, R>,
    inner: &JoinSpec<'_, S>,
    block_size: usize,
) -> Result<M::Store>
where
    M: StorageManager + ?Sized,
    R: RecordStore + ?Sized,
    S: RecordStore + ?Sized,
{
    outer.validate()?;
    inner.validate()?;
    let (len_r, len_s) = (outer.record_len(), inner.record_len());
    let records_per_block = block_size / len_r;
    if records_per_block == 0 {
        return Err(JoinError::InvalidDescriptor(format!(
            "a block of {} bytes cannot hold one record of {} ({} bytes)",
            block_size,
            outer.display_name(),
            len_r
        )));
    }
    info!(
        "block-nested-loop join: {} ({} records) with {} ({} records), {} records per block",
        outer.display_name(),
        outer.store().num_records(),
        inner.display_name(),
        inner.store().num_records(),
        records_per_block
    );
    let mut joined = manager
        .create_store(len_r + len_s)
        .map_err(JoinError::open_failure(Resource::ResultStore))?;
    // A block never needs more slots than the outer relation has records.
    let block_capacity = records_per_block.min(outer.store().num_records().max(1));
    let mut block = vec![0; block_capacity * len_r];
    let mut block_keys = Vec::with_capacity(block_capacity);
    let (mut rec_s, mut rec_joined) = (vec![0; len_s], vec![0; len_r + len_s]);
    let mut scan_r = outer
        .store()
        .open_scan()
        .map_err(JoinError::open_failure(Resource::OuterScan))?;
    let mut num_blocks = 0;
    let mut last_block = false;
    while !last_block {
        let filled = fill_block(scan_r.as_mut(), &mut block, len_r)?;
        if filled < block_capacity {
            last_block = true;
        }
        if filled == 0 {
            break;
        }
        let block = &block[..filled * len_r];
        block_keys.clear();
        for rec_r in block.chunks_exact(len_r) {
            block_keys.push(outer.key(rec_r)?);
        }
        num_blocks += 1;
        debug!("block {}: {} outer records", num_blocks, filled);
        let mut scan_s = inner
            .store()
            .open_scan()
            .map_err(JoinError::open_failure(Resource::InnerScan))?;
        while scan_s.next_record(&mut rec_s)?.is_some() {
            let key_s = inner.key(&rec_s)?;
            for (rec_r, &key_r) in block.chunks_exact(len_r).zip(&block_keys) {
                if key_r == key_s {
                    emit(&mut joined, &mut rec_joined, rec_r, &rec_s)?;
                }
            }
        }
    }
    info!(
        "block-nested-loop join: {} records in {} blocks",
        joined.num_records(),
        num_blocks
    );
    Ok(joined)
}

/// Fills `block` with the next records of `scan`, returns how many were read.
fn fill_block(scan: &mut dyn RecordScan, block: &mut [u8], record_len: usize) -> Result<usize> {
    let mut filled = 0;
    for slot in block.chunks_exact_mut(record_len) {
        if scan.next_record(slot)?.is_none() {
            break;
        }
        filled += 1;
    }
    Ok(filled)
}
