//! Nested-loop equi-joins over fixed-length record files.

pub mod join;
pub mod loader;
pub mod memory_manager;
pub mod storage;
pub mod types;
