use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg, ArgMatches,
    SubCommand,
};
use itertools::Itertools;
use log::{info, warn};
use nljoin::{
    join::Algorithm,
    loader::Relation,
    storage::{collect_records, HeapFile, HeapFileManager, RecordStore, StoreType},
    types::decode_ints,
};
use rusqlite::Connection;
use std::{error::Error, time::Instant};

const MAX_DEFAULT_BLOCK_SIZE: usize = 64 << 20;

/// A quarter of the available memory, capped at `MAX_DEFAULT_BLOCK_SIZE`.
fn default_block_size() -> usize {
    match sys_info::mem_info() {
        Ok(mem) => std::cmp::min(mem.avail as usize * 1024 / 4, MAX_DEFAULT_BLOCK_SIZE),
        Err(e) => {
            warn!("cannot read available memory: {}", e);
            1 << 20
        }
    }
}

fn parse_manager(matches: &ArgMatches) -> Result<HeapFileManager, Box<dyn Error>> {
    let store_type = StoreType::new(
        matches.value_of("store").unwrap(),
        matches.value_of("directory"),
    )
    .ok_or("invalid store type")?;
    Ok(HeapFileManager::new(store_type).page_size(matches.value_of("page-size").unwrap().parse()?))
}

fn parse_block_size(matches: &ArgMatches) -> Result<usize, Box<dyn Error>> {
    Ok(match matches.value_of("block-size") {
        Some(block_size) => block_size.parse()?,
        None => default_block_size(),
    })
}

type Relations = (HeapFileManager, Relation<HeapFile>, Relation<HeapFile>);

fn load_relations(matches: &ArgMatches) -> Result<Relations, Box<dyn Error>> {
    let manager = parse_manager(matches)?;
    let conn = Connection::open(matches.value_of("DB").unwrap())?;
    let outer = Relation::from_sqlite(&conn, matches.value_of("outer").unwrap(), &manager)?;
    let inner = Relation::from_sqlite(&conn, matches.value_of("inner").unwrap(), &manager)?;
    Ok((manager, outer, inner))
}

fn handle_join(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (manager, outer, inner) = load_relations(matches)?;
    let algorithm = Algorithm::from_name(
        matches.value_of("algorithm").unwrap(),
        parse_block_size(matches)?,
    )
    .ok_or("invalid algorithm")?;
    let outer_spec = outer.spec(matches.value_of("outer-key").unwrap())?;
    let inner_spec = inner.spec(matches.value_of("inner-key").unwrap())?;
    outer.store().reset_stats();
    inner.store().reset_stats();
    let time_now = Instant::now();
    let joined = algorithm.join(&manager, &outer_spec, &inner_spec)?;
    eprintln!("algorithm: {}", algorithm);
    eprintln!("join_time: {}", (Instant::now() - time_now).as_millis());
    eprintln!("num_rows: {}", joined.num_records());
    eprintln!("outer_io: {}", outer.store().stats());
    eprintln!("inner_io: {}", inner.store().stats());
    if matches.is_present("print") {
        for record in collect_records(&joined)? {
            println!("{}", decode_ints(&record).iter().join(" "));
        }
    }
    Ok(())
}

fn handle_compare(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (manager, outer, inner) = load_relations(matches)?;
    let block_size = parse_block_size(matches)?;
    let outer_spec = outer.spec(matches.value_of("outer-key").unwrap())?;
    let inner_spec = inner.spec(matches.value_of("inner-key").unwrap())?;
    let mut results = Vec::with_capacity(3);
    for algorithm in vec![
        Algorithm::TupleNestedLoop,
        Algorithm::BlockNestedLoop { block_size },
        Algorithm::IndexNestedLoop,
    ] {
        let joined = algorithm.join(&manager, &outer_spec, &inner_spec)?;
        info!("{}: {} records", algorithm, joined.num_records());
        results.push((algorithm, collect_records(&joined)?.into_iter().sorted().collect_vec()));
    }
    let mut all_equal = true;
    for ((a, rows_a), (b, rows_b)) in results.iter().circular_tuple_windows() {
        if rows_a == rows_b {
            println!("PASS: {} and {} yield equivalent results", a, b);
        } else {
            println!("FAIL: {} and {} DO NOT yield equivalent results", a, b);
            all_equal = false;
        }
    }
    if all_equal {
        Ok(())
    } else {
        Err("join algorithms disagree".into())
    }
}

fn relation_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("DB")
            .help("SQLite3 file holding both relations")
            .required(true),
        Arg::with_name("outer")
            .help("Table of the outer relation")
            .long("outer")
            .takes_value(true)
            .required(true),
        Arg::with_name("outer-key")
            .help("Join column of the outer relation")
            .long("outer-key")
            .takes_value(true)
            .required(true),
        Arg::with_name("inner")
            .help("Table of the inner relation")
            .long("inner")
            .takes_value(true)
            .required(true),
        Arg::with_name("inner-key")
            .help("Join column of the inner relation")
            .long("inner-key")
            .takes_value(true)
            .required(true),
        Arg::with_name("block-size")
            .help("Bytes of outer records held in memory by the block nested-loop join")
            .long("block-size")
            .takes_value(true),
        Arg::with_name("page-size")
            .help("Page size of the record stores")
            .long("page-size")
            .takes_value(true)
            .default_value("1024"),
        Arg::with_name("store")
            .help("Where record stores keep their pages")
            .long("store")
            .takes_value(true)
            .default_value("mem")
            .possible_values(&["mem", "mmap"]),
        Arg::with_name("directory")
            .help("Directory of the memory mapped files")
            .long("directory")
            .takes_value(true),
    ]
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("join")
                .about("Joins two tables")
                .after_help(
                    r"Every column of both tables must hold integers, e.g.

  CREATE TABLE employee (id INT, age INT, proj INT);
  CREATE TABLE project (id INT, fund INT, manager INT);
",
                )
                .args(&relation_args())
                .arg(
                    Arg::with_name("algorithm")
                        .long("algorithm")
                        .takes_value(true)
                        .default_value("block")
                        .possible_values(&["tuple", "block", "index"]),
                )
                .arg(
                    Arg::with_name("print")
                        .help("Prints the joined records")
                        .long("print")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("compare")
                .about("Checks that all join algorithms yield equivalent results")
                .args(&relation_args()),
        )
        .get_matches();
    if let Some(matches) = matches.subcommand_matches("join") {
        handle_join(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("compare") {
        handle_compare(matches)?;
    }
    Ok(())
}
