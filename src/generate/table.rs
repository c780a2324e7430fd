//! Generated table and database containers.

use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

/// Column names plus row-oriented records; every row has one value per column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl GeneratedTable {
    /// Build a table from rows; short rows are padded with blanks, long rows cut
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Blank);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

/// Generated tables keyed by name, in the order they were committed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedDatabase {
    tables: IndexMap<String, GeneratedTable>,
}

impl GeneratedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: GeneratedTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&GeneratedTable> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in commit order (preloaded tables first)
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeneratedTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn into_tables(self) -> IndexMap<String, GeneratedTable> {
        self.tables
    }
}

/// Column-by-column table assembly.
///
/// Columns may come out with different lengths (a primary key drawn from a
/// small domain, exclusion filtering). Each append truncates either the new
/// column or every existing column so all columns share the shorter length.
/// Truncating already-built rows drops data, so it is logged.
#[derive(Debug)]
pub struct TableBuilder {
    table: String,
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
    rows: Option<usize>,
}

impl TableBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            data: Vec::new(),
            rows: None,
        }
    }

    /// Current row count (`None` before the first column)
    pub fn row_count(&self) -> Option<usize> {
        self.rows
    }

    pub fn push_column(&mut self, name: impl Into<String>, mut values: Vec<Value>) {
        let name = name.into();
        match self.rows {
            None => self.rows = Some(values.len()),
            Some(rows) if values.len() < rows => {
                warn!(
                    table = %self.table,
                    column = %name,
                    from = rows,
                    to = values.len(),
                    "truncating table to shorter column"
                );
                for column in &mut self.data {
                    column.truncate(values.len());
                }
                self.rows = Some(values.len());
            }
            Some(rows) => values.truncate(rows),
        }
        self.columns.push(name);
        self.data.push(values);
    }

    pub fn build(self) -> GeneratedTable {
        let rows = self.rows.unwrap_or(0);
        let mut columns_iter: Vec<std::vec::IntoIter<Value>> =
            self.data.into_iter().map(Vec::into_iter).collect();
        let records = (0..rows)
            .map(|_| {
                columns_iter
                    .iter_mut()
                    .map(|col| col.next().unwrap_or(Value::Blank))
                    .collect()
            })
            .collect();
        GeneratedTable {
            columns: self.columns,
            rows: records,
        }
    }
}
