//! Preloaded tables: caller-supplied data used instead of generating a table.

use crate::error::GenerateError;
use crate::generate::GeneratedTable;
use crate::schema::{DataType, Schema, TableDef};
use crate::value::Value;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Where a preloaded table comes from
#[derive(Debug, Clone)]
pub enum PreloadSource {
    /// CSV file with a header row
    Path(PathBuf),
    /// Data already in memory
    Table(GeneratedTable),
}

impl From<PathBuf> for PreloadSource {
    fn from(path: PathBuf) -> Self {
        PreloadSource::Path(path)
    }
}

impl From<GeneratedTable> for PreloadSource {
    fn from(table: GeneratedTable) -> Self {
        PreloadSource::Table(table)
    }
}

/// Preloaded tables keyed by table name
pub type Preload = IndexMap<String, PreloadSource>;

/// Read a CSV file into a table.
///
/// When `table` is given, cells of declared columns are coerced through the
/// column datatype; other cells are kept as text. Empty cells are blank.
pub fn read_csv_table(path: &Path, table: Option<&TableDef>) -> Result<GeneratedTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let text = DataType::Varchar;
    let types: Vec<&DataType> = columns
        .iter()
        .map(|name| {
            table
                .and_then(|t| t.get_column(name))
                .map(|c| &c.datatype)
                .unwrap_or(&text)
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = types
            .iter()
            .enumerate()
            .map(|(i, datatype)| Value::parse_as(datatype, record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Ok(GeneratedTable::new(columns, rows))
}

/// Load every preload source, in the order given
pub fn resolve(
    preload: Preload,
    schema: &Schema,
) -> Result<IndexMap<String, GeneratedTable>, GenerateError> {
    preload
        .into_iter()
        .map(|(name, source)| {
            let table = match source {
                PreloadSource::Table(table) => table,
                PreloadSource::Path(path) => read_csv_table(&path, schema.get_table(&name))
                    .map_err(|source| GenerateError::Preload {
                        table: name.clone(),
                        source,
                    })?,
            };
            Ok((name, table))
        })
        .collect()
}
