//! Writing generated databases as CSV files or INSERT scripts.
//!
//! One file per table, named after the table, in database order.

use crate::error::ExportError;
use crate::generate::{GeneratedDatabase, GeneratedTable};
use crate::schema::{DataType, Schema, TableDef};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
pub const STMT_BUFFER_COUNT: usize = 100;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Sql,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Sql => "sql",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "sql" | "insert" | "inserts" => Ok(ExportFormat::Sql),
            _ => Err(format!("Unknown format: {}. Valid options: csv, sql", s)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write every table of `db` into `out_dir`, returning the written paths
pub fn export_db(
    db: &GeneratedDatabase,
    schema: &Schema,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(db.len());
    for (name, table) in db.iter() {
        let path = out_dir.join(format!("{}.{}", name, format.extension()));
        match format {
            ExportFormat::Csv => write_csv(table, &path)?,
            ExportFormat::Sql => write_inserts(name, table, schema.get_table(name), &path)?,
        }
        written.push(path);
    }
    Ok(written)
}

/// Header row of column names, one record per row, blanks as empty cells
pub fn write_csv(table: &GeneratedTable, path: &Path) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::with_capacity(WRITER_BUFFER_SIZE, file));
    writer.write_record(table.columns()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(Value::to_string))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One INSERT statement per row
pub fn write_inserts(
    name: &str,
    table: &GeneratedTable,
    def: Option<&TableDef>,
    path: &Path,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let types: Vec<Option<&DataType>> = table
        .columns()
        .iter()
        .map(|c| def.and_then(|d| d.get_column(c)).map(|c| &c.datatype))
        .collect();

    let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, create(path)?);
    let mut write_count = 0;
    for row in table.rows() {
        let stmt = to_insert(name, table.columns(), row, &types);
        writer.write_all(stmt.as_bytes()).map_err(io_err)?;
        writer.write_all(b"\n").map_err(io_err)?;

        write_count += 1;
        if write_count >= STMT_BUFFER_COUNT {
            write_count = 0;
            writer.flush().map_err(io_err)?;
        }
    }
    writer.flush().map_err(io_err)
}

/// Render one row as an INSERT statement.
///
/// Blank cells are left out of the column list so the database default
/// applies; a row with no values at all becomes `DEFAULT VALUES`.
pub fn to_insert(
    table: &str,
    columns: &[String],
    row: &[Value],
    types: &[Option<&DataType>],
) -> String {
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());
    for (i, (column, value)) in columns.iter().zip(row).enumerate() {
        if value.is_blank() {
            continue;
        }
        names.push(column.as_str());
        values.push(sql_literal(value, types.get(i).copied().flatten()));
    }

    if names.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES;", table);
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        names.join(", "),
        values.join(", ")
    )
}

/// Quote by declared column type; numeric columns stay bare unless the cell
/// never parsed as a number
fn sql_literal(value: &Value, datatype: Option<&DataType>) -> String {
    match (datatype, value) {
        (Some(dt), Value::Int(_) | Value::Decimal(_)) if !dt.is_numeric() => {
            format!("'{}'", value)
        }
        _ => value.to_sql(),
    }
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
