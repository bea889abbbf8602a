use itertools::Itertools;
use nljoin::{
    join::{
        block_nested_loop, index_nested_loop, tuple_nested_loop, Algorithm, JoinError, JoinSide,
        JoinSpec, RecordLayout,
    },
    storage::{
        collect_records, HeapFile, HeapFileManager, RecordStore, StorageManager, StoreType,
    },
    types::{decode_ints, encode_ints, JoinKey},
};
use std::collections::HashMap;

/// Employees `(id, age, proj)` joined on `proj`.
fn create_r(num_records: i32, num_projects: i32) -> Vec<Vec<u8>> {
    (0..num_records)
        .map(|id| encode_ints(&[id, 20 + (id * 7) % 45, (id * 31 + 3) % num_projects]))
        .collect()
}

/// Projects `(fund, id)` joined on `id`, some ids appear more than once.
fn create_s(num_records: i32) -> Vec<Vec<u8>> {
    (0..num_records)
        .map(|i| encode_ints(&[1000 * i, (i * 13) % (num_records - num_records / 4)]))
        .collect()
}

fn r_layout() -> RecordLayout {
    RecordLayout::new(12, 8).unwrap()
}

fn s_layout() -> RecordLayout {
    RecordLayout::new(8, 4).unwrap()
}

fn algorithms(block_sizes: &[usize]) -> Vec<Algorithm> {
    let mut algorithms = vec![Algorithm::TupleNestedLoop, Algorithm::IndexNestedLoop];
    algorithms.extend(
        block_sizes
            .iter()
            .map(|&block_size| Algorithm::BlockNestedLoop { block_size }),
    );
    algorithms
}

fn run(
    algorithm: Algorithm,
    manager: &HeapFileManager,
    r: &HeapFile,
    r_layout: RecordLayout,
    s: &HeapFile,
    s_layout: RecordLayout,
) -> Vec<Vec<u8>> {
    let joined = algorithm
        .join(
            manager,
            &JoinSpec::new(r, r_layout).with_name("R"),
            &JoinSpec::new(s, s_layout).with_name("S"),
        )
        .unwrap();
    collect_records(&joined).unwrap().into_iter().sorted().collect()
}

fn expected_cardinality(r: &[Vec<u8>], s: &[Vec<u8>]) -> usize {
    let mut s_counts: HashMap<JoinKey, usize> = HashMap::new();
    for rec in s {
        *s_counts.entry(s_layout().key(rec).unwrap()).or_default() += 1;
    }
    r.iter()
        .map(|rec| s_counts.get(&r_layout().key(rec).unwrap()).copied().unwrap_or(0))
        .sum()
}

#[test]
fn test_equivalence() {
    let (r_rows, s_rows) = (create_r(300, 40), create_s(60));
    let r = HeapFile::from_records(12, &r_rows).unwrap();
    let s = HeapFile::from_records(8, &s_rows).unwrap();
    let manager = HeapFileManager::default();
    let expected = run(
        Algorithm::TupleNestedLoop,
        &manager,
        &r,
        r_layout(),
        &s,
        s_layout(),
    );
    assert_eq!(expected.len(), expected_cardinality(&r_rows, &s_rows));
    assert!(!expected.is_empty());
    for algorithm in algorithms(&[12, 13, 24, 120, 1200, 3600, 1 << 16]) {
        assert_eq!(
            run(algorithm, &manager, &r, r_layout(), &s, s_layout()),
            expected,
            "{}",
            algorithm
        );
    }
}

#[test]
fn test_byte_fidelity() {
    let (r_rows, s_rows) = (create_r(50, 10), create_s(12));
    let r = HeapFile::from_records(12, &r_rows).unwrap();
    let s = HeapFile::from_records(8, &s_rows).unwrap();
    let manager = HeapFileManager::default();
    for algorithm in algorithms(&[36]) {
        let joined = run(algorithm, &manager, &r, r_layout(), &s, s_layout());
        assert_eq!(joined.len(), expected_cardinality(&r_rows, &s_rows));
        for rec in &joined {
            assert_eq!(rec.len(), 20);
            let (rec_r, rec_s) = rec.split_at(12);
            assert!(r_rows.iter().any(|x| x.as_slice() == rec_r));
            assert!(s_rows.iter().any(|x| x.as_slice() == rec_s));
            assert_eq!(r_layout().key(rec_r).unwrap(), s_layout().key(rec_s).unwrap());
        }
    }
}

#[test]
fn test_duplicate_keys() {
    let r = HeapFile::from_records(5, vec![b"\x01\0\0\0a", b"\x01\0\0\0b"]).unwrap();
    let s = HeapFile::from_records(5, vec![b"\x01\0\0\0x"]).unwrap();
    let layout = RecordLayout::new(5, 0).unwrap();
    let manager = HeapFileManager::default();
    for algorithm in algorithms(&[5, 10, 1024]) {
        assert_eq!(
            run(algorithm, &manager, &r, layout, &s, layout),
            vec![
                b"\x01\0\0\0a\x01\0\0\0x".to_vec(),
                b"\x01\0\0\0b\x01\0\0\0x".to_vec()
            ],
            "{}",
            algorithm
        );
    }
}

#[test]
fn test_empty_inputs() {
    let empty_r = HeapFile::in_memory(12).unwrap();
    let empty_s = HeapFile::in_memory(8).unwrap();
    let r = HeapFile::from_records(12, create_r(20, 5)).unwrap();
    let s = HeapFile::from_records(8, create_s(8)).unwrap();
    let manager = HeapFileManager::default();
    for algorithm in algorithms(&[12, 48]) {
        for &(r, s) in &[(&empty_r, &s), (&r, &empty_s), (&empty_r, &empty_s)] {
            assert!(run(algorithm, &manager, r, r_layout(), s, s_layout()).is_empty());
        }
    }
}

#[test]
fn test_no_match() {
    let r = HeapFile::from_records(12, (0..30).map(|i| encode_ints(&[i, 0, 2 * i]))).unwrap();
    let s = HeapFile::from_records(8, (0..30).map(|i| encode_ints(&[i, 2 * i + 1]))).unwrap();
    let manager = HeapFileManager::default();
    for algorithm in algorithms(&[12, 100]) {
        assert!(run(algorithm, &manager, &r, r_layout(), &s, s_layout()).is_empty());
    }
}

#[test]
fn test_block_size_boundary() {
    let r = HeapFile::from_records(12, create_r(25, 6)).unwrap();
    let s = HeapFile::from_records(8, create_s(8)).unwrap();
    let manager = HeapFileManager::default();
    let (r_spec, s_spec) = (JoinSpec::new(&r, r_layout()), JoinSpec::new(&s, s_layout()));
    let tuple = collect_records(&tuple_nested_loop(&manager, &r_spec, &s_spec).unwrap()).unwrap();
    let tuple_scans = s.stats().scans_opened;
    s.reset_stats();
    let block = block_nested_loop(&manager, &r_spec, &s_spec, 12).unwrap();
    let block = collect_records(&block).unwrap();
    assert_eq!(block, tuple);
    assert_eq!(s.stats().scans_opened, tuple_scans);
    assert_eq!(tuple_scans, 25);
    for &block_size in &[0, 1, 11] {
        match block_nested_loop(&manager, &r_spec, &s_spec, block_size) {
            Err(JoinError::InvalidDescriptor(_)) => (),
            _ => panic!("block_size={} accepted", block_size),
        }
    }
}

#[test]
fn test_io_cost() {
    let r = HeapFile::from_records(12, create_r(100, 10)).unwrap();
    let s = HeapFile::from_records(8, create_s(200)).unwrap();
    let manager = HeapFileManager::default();
    let (r_spec, s_spec) = (JoinSpec::new(&r, r_layout()), JoinSpec::new(&s, s_layout()));
    let s_pages = s.num_pages() as u64;
    assert_eq!(s_pages, 2);

    tuple_nested_loop(&manager, &r_spec, &s_spec).unwrap();
    assert_eq!(s.stats().scans_opened, 100);
    assert_eq!(s.stats().pages_read, 100 * s_pages);

    s.reset_stats();
    block_nested_loop(&manager, &r_spec, &s_spec, 12 * 30).unwrap();
    assert_eq!(s.stats().scans_opened, 4);
    assert_eq!(s.stats().pages_read, 4 * s_pages);

    s.reset_stats();
    r.reset_stats();
    let joined = index_nested_loop(&manager, &r_spec, &s_spec).unwrap();
    assert_eq!(s.stats().scans_opened, 1);
    assert_eq!(s.stats().pages_read, s_pages + joined.num_records() as u64);
    assert_eq!(r.stats().scans_opened, 1);
    assert_eq!(r.stats().records_read, 100);
}

#[test]
fn test_mmap_store() {
    let dir = tempfile::tempdir().unwrap();
    let manager = HeapFileManager::new(StoreType::Mmap(Some(dir.path().into()))).page_size(64);
    let mut r = manager.create_store(12).unwrap();
    let mut s = manager.create_store(8).unwrap();
    for rec in create_r(80, 9) {
        r.insert_record(&rec).unwrap();
    }
    for rec in create_s(20) {
        s.insert_record(&rec).unwrap();
    }
    let expected = run(
        Algorithm::TupleNestedLoop,
        &HeapFileManager::default(),
        &r,
        r_layout(),
        &s,
        s_layout(),
    );
    assert!(!expected.is_empty());
    for algorithm in algorithms(&[64, 640]) {
        assert_eq!(run(algorithm, &manager, &r, r_layout(), &s, s_layout()), expected);
    }
}

#[test]
fn test_join_joined_relation() {
    let r = HeapFile::from_records(8, (0..6).map(|i| encode_ints(&[i, i % 3]))).unwrap();
    let s = HeapFile::from_records(8, (0..3).map(|i| encode_ints(&[i, 10 + i]))).unwrap();
    let t = HeapFile::from_records(4, vec![encode_ints(&[11]), encode_ints(&[12])]).unwrap();
    let (r_layout, s_layout) = (RecordLayout::new(8, 4).unwrap(), RecordLayout::new(8, 0).unwrap());
    let manager = HeapFileManager::default();
    let rs = index_nested_loop(
        &manager,
        &JoinSpec::new(&r, r_layout),
        &JoinSpec::new(&s, s_layout),
    )
    .unwrap();
    assert_eq!(
        r_layout.joined(&s_layout, JoinSide::Inner),
        RecordLayout::new(16, 8).unwrap()
    );
    // Joins on the second column of S.
    let rs_layout = RecordLayout::new(16, 12).unwrap();
    let rst = block_nested_loop(
        &manager,
        &JoinSpec::new(&rs, rs_layout),
        &JoinSpec::new(&t, RecordLayout::new(4, 0).unwrap()),
        32,
    )
    .unwrap();
    let rows: Vec<_> = collect_records(&rst)
        .unwrap()
        .iter()
        .map(|rec| decode_ints(rec))
        .sorted()
        .collect();
    assert_eq!(
        rows,
        vec![
            vec![1, 1, 1, 11, 11],
            vec![2, 2, 2, 12, 12],
            vec![4, 1, 1, 11, 11],
            vec![5, 2, 2, 12, 12],
        ]
    );
}

#[test]
fn test_descriptor_mismatch() {
    let r = HeapFile::from_records(12, create_r(3, 2)).unwrap();
    let s = HeapFile::from_records(8, create_s(4)).unwrap();
    let manager = HeapFileManager::default();
    for algorithm in algorithms(&[120]) {
        match algorithm.join(
            &manager,
            &JoinSpec::new(&r, s_layout()),
            &JoinSpec::new(&s, s_layout()),
        ) {
            Err(JoinError::InvalidDescriptor(_)) => (),
            _ => panic!("{} accepted a layout of the wrong length", algorithm),
        }
    }
    assert_eq!(r.stats().scans_opened, 0);
    assert_eq!(s.stats().scans_opened, 0);
}
