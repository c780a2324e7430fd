//! Schema model for DDL-driven data generation.
//!
//! This module provides:
//! - The schema IR: tables, columns, primary keys, foreign keys, enum checks
//! - DDL parsing for `CREATE TABLE` / `ALTER TABLE ... ADD CONSTRAINT`
//! - Exclusivity group registration
//! - Dependency ordering with cycle detection
//! - Rendering the IR back to canonical DDL

mod constraint;
mod ddl;
mod graph;
mod lexer;
mod render;

pub use constraint::{parse_clause, Constraint, ConstraintLine};
pub use ddl::{clean_document, parse_schema, split_blocks, SchemaBuilder};
pub use graph::{processing_order, DependencyGraph};
pub use lexer::{Lexer, Token};

use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Primitive column type classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Varchar,
    Decimal,
    Date,
    /// Any type name outside the supported set, kept verbatim (lowercased)
    Other(String),
}

impl DataType {
    /// Classify a lowercased SQL type name
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" => DataType::Int,
            "varchar" | "char" | "character" => DataType::Varchar,
            "decimal" | "numeric" => DataType::Decimal,
            "date" => DataType::Date,
            other => DataType::Other(other.to_string()),
        }
    }

    /// Canonical type name used when rendering DDL
    pub fn name(&self) -> &str {
        match self {
            DataType::Int => "int",
            DataType::Varchar => "varchar",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::Other(name) => name,
        }
    }

    /// Whether values of this type are rendered unquoted in SQL
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Decimal)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: DataType,
    /// varchar: `[max_length]`, decimal: `[total_digits, fraction_digits]`
    #[serde(default)]
    pub type_args: Vec<u32>,
    /// `Some(true)` for SIGNED, `Some(false)` for UNSIGNED
    #[serde(default)]
    pub signed: Option<bool>,
    /// `Some(true)` for NULL, `Some(false)` for NOT NULL
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Informational only, never enforced during generation
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            type_args: Vec::new(),
            signed: None,
            nullable: None,
            default: None,
        }
    }

    pub fn args(mut self, args: &[u32]) -> Self {
        self.type_args = args.to_vec();
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = Some(false);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Whether the column was explicitly declared UNSIGNED
    pub fn is_unsigned(&self) -> bool {
        self.signed == Some(false)
    }
}

/// Table definition from a CREATE block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    /// Columns in declaration order; generated output keeps this order
    pub columns: Vec<ColumnDef>,
    /// Primary key column names, in `PRIMARY KEY (...)` clause order
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_pk_column(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// `FOREIGN KEY (column) REFERENCES referenced_table(referenced_column)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    pub column: String,
    pub referenced_table: String,
    /// Column in the referenced table supplying the value pool
    pub referenced_column: String,
}

/// `CHECK (column IN (v1, v2, ...))`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumCheckConstraint {
    pub column: String,
    pub allowed_values: Vec<String>,
}

/// Mutual exclusivity of shared column values across a set of tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusivitySpec {
    /// Other tables of the group (never contains the owning table)
    pub peer_tables: BTreeSet<String>,
    /// Columns whose values must not be shared with any peer
    pub shared_columns: BTreeSet<String>,
}

/// A constraint clause that was dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConstraint {
    pub table: String,
    pub clause: String,
    pub reason: String,
}

/// Where a schema comes from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// A `.sql` DDL file, or a `.json` file holding a serialized schema
    Path(PathBuf),
    /// Raw DDL text
    Ddl(String),
    /// An already-parsed schema structure
    Parsed(serde_json::Value),
}

/// Complete schema IR
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Table definitions keyed by name, in declaration order
    #[serde(default)]
    pub tables: IndexMap<String, TableDef>,
    /// Foreign keys declared for each table
    #[serde(default)]
    pub foreign_keys: IndexMap<String, Vec<ForeignKeyConstraint>>,
    /// Enum checks declared for each table
    #[serde(default)]
    pub checks: IndexMap<String, Vec<EnumCheckConstraint>>,
    /// Exclusivity groups, keyed by member table
    #[serde(default)]
    pub exclusivity: IndexMap<String, ExclusivitySpec>,
    /// Constraint clauses dropped while parsing
    #[serde(skip)]
    pub skipped: Vec<SkippedConstraint>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a schema from a file, DDL text, or a serialized structure
    pub fn load(source: SchemaSource) -> Result<Self, SchemaError> {
        match source {
            SchemaSource::Path(path) => {
                let text = fs::read_to_string(&path).map_err(|source| SchemaError::Io {
                    path: path.clone(),
                    source,
                })?;
                let is_json = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if is_json {
                    Self::load(SchemaSource::Parsed(serde_json::from_str(&text)?))
                } else {
                    parse_schema(&text)
                }
            }
            SchemaSource::Ddl(text) => parse_schema(&text),
            SchemaSource::Parsed(value) => {
                if !value.is_object() {
                    return Err(SchemaError::UnsupportedInputType(
                        json_kind(&value).to_string(),
                    ));
                }
                Ok(serde_json::from_value(value)?)
            }
        }
    }

    /// Add a table definition (replacing any table of the same name)
    pub fn add_table(&mut self, table: TableDef) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn add_foreign_key(&mut self, table: &str, fk: ForeignKeyConstraint) {
        self.foreign_keys
            .entry(table.to_string())
            .or_default()
            .push(fk);
    }

    pub fn add_check(&mut self, table: &str, check: EnumCheckConstraint) {
        self.checks.entry(table.to_string()).or_default().push(check);
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn foreign_keys_for(&self, table: &str) -> &[ForeignKeyConstraint] {
        self.foreign_keys
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn checks_for(&self, table: &str) -> &[EnumCheckConstraint] {
        self.checks.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First foreign key declared on `table.column`
    pub fn foreign_key(&self, table: &str, column: &str) -> Option<&ForeignKeyConstraint> {
        self.foreign_keys_for(table)
            .iter()
            .find(|fk| fk.column == column)
    }

    /// First enum check declared on `table.column`
    pub fn check(&self, table: &str, column: &str) -> Option<&EnumCheckConstraint> {
        self.checks_for(table).iter().find(|c| c.column == column)
    }

    /// Tables referenced by `table`'s foreign keys, deduplicated, in declaration order
    pub fn referenced_tables(&self, table: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for fk in self.foreign_keys_for(table) {
            if !out.contains(&fk.referenced_table.as_str()) {
                out.push(&fk.referenced_table);
            }
        }
        out
    }

    pub fn exclusivity_for(&self, table: &str) -> Option<&ExclusivitySpec> {
        self.exclusivity.get(table)
    }

    /// Declare that `tables` must never share values in `columns`.
    ///
    /// Every member gets a spec whose peers are the other members. A table
    /// already in a group leaves it first: its old peers drop it, and a peer
    /// left without any other member loses its spec. Peer relations are
    /// therefore always symmetric.
    pub fn register_exclusivity<T, C>(&mut self, tables: &[T], columns: &[C]) -> Result<(), SchemaError>
    where
        T: AsRef<str>,
        C: AsRef<str>,
    {
        let shared_columns: BTreeSet<String> = columns
            .iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if shared_columns.is_empty() {
            return Err(SchemaError::InvalidExclusivityConfig(
                "at least one shared column is required".to_string(),
            ));
        }

        let members: BTreeSet<String> = tables
            .iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        for table in &members {
            if let Some(old) = self.exclusivity.shift_remove(table) {
                warn!(table = %table, "replacing existing exclusivity group");
                for peer in old.peer_tables.iter().filter(|p| !members.contains(*p)) {
                    self.leave_group(peer, table);
                }
            }
        }

        for table in &members {
            let spec = ExclusivitySpec {
                peer_tables: members.iter().filter(|t| *t != table).cloned().collect(),
                shared_columns: shared_columns.clone(),
            };
            self.exclusivity.insert(table.clone(), spec);
        }
        Ok(())
    }

    /// Drop `departed` from `table`'s peers; a spec without peers is removed
    fn leave_group(&mut self, table: &str, departed: &str) {
        let Some(spec) = self.exclusivity.get_mut(table) else {
            return;
        };
        spec.peer_tables.remove(departed);
        if spec.peer_tables.is_empty() {
            self.exclusivity.shift_remove(table);
        }
    }

    /// Constraint clauses that were dropped while parsing
    pub fn skipped_constraints(&self) -> &[SkippedConstraint] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
