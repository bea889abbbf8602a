//! Populates record stores from SQLite tables.

use crate::{
    join::{JoinError, JoinSpec, RecordLayout},
    storage::{RecordStore, StorageError, StorageManager},
    types::{JoinKey, KEY_SIZE},
};
use derive_more::Display;
use log::info;

#[derive(Debug, Display)]
pub enum LoadError {
    #[display(fmt = "SQLite error: {}", _0)]
    Sqlite(rusqlite::Error),
    #[display(fmt = "{}", _0)]
    Storage(StorageError),
    #[display(fmt = "{}", _0)]
    Layout(JoinError),
    #[display(fmt = "table {} has no columns", _0)]
    NoColumns(String),
    #[display(fmt = "table {} has no column {}", _0, _1)]
    NoSuchColumn(String, String),
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Sqlite(e) => Some(e),
            LoadError::Storage(e) => Some(e),
            LoadError::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LoadError {
    fn from(e: rusqlite::Error) -> Self {
        LoadError::Sqlite(e)
    }
}

impl From<StorageError> for LoadError {
    fn from(e: StorageError) -> Self {
        LoadError::Storage(e)
    }
}

/// A table whose integer columns were copied into a record store.
///
/// Every column becomes a little-endian [`JoinKey`] in the record, in the
/// order of the table's columns.
pub struct Relation<S> {
    name: String,
    columns: Vec<String>,
    store: S,
}

impl<S: RecordStore> Relation<S> {
    /// Reads all rows of `table`, which must only contain integer columns.
    pub fn from_sqlite<M>(
        conn: &rusqlite::Connection,
        table: &str,
        manager: &M,
    ) -> Result<Self, LoadError>
    where
        M: StorageManager<Store = S> + ?Sized,
    {
        let query = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let mut stmt = conn.prepare(&query)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        if columns.is_empty() {
            return Err(LoadError::NoColumns(String::from(table)));
        }
        let mut store = manager.create_store(columns.len() * KEY_SIZE)?;
        let mut record = Vec::with_capacity(store.record_len());
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            record.clear();
            for i in 0..columns.len() {
                record.extend_from_slice(&row.get::<_, JoinKey>(i)?.to_le_bytes());
            }
            store.insert_record(&record)?;
        }
        info!(
            "loaded table {} ({} columns, {} rows)",
            table,
            columns.len(),
            store.num_records()
        );
        Ok(Self {
            name: String::from(table),
            columns,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Describes this relation joined on `column`.
    pub fn spec(&self, column: &str) -> Result<JoinSpec<'_, S>, LoadError> {
        let pos = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| LoadError::NoSuchColumn(self.name.clone(), String::from(column)))?;
        let layout = RecordLayout::new(self.columns.len() * KEY_SIZE, pos * KEY_SIZE)
            .map_err(LoadError::Layout)?;
        Ok(JoinSpec::new(&self.store, layout)
            .with_name(self.name.as_str())
            .with_num_attrs(self.columns.len()))
    }
}
