//! Error types for schema parsing, value synthesis, generation and export.

use std::path::PathBuf;
use thiserror::Error;

/// Which kind of DDL block a duplicate was found for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Create,
    Alter,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Create => write!(f, "CREATE"),
            BlockKind::Alter => write!(f, "ALTER"),
        }
    }
}

/// Errors raised while loading or parsing a schema, or registering exclusivity
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unsupported schema input type: {0}")]
    UnsupportedInputType(String),

    #[error("{0} operation not supported")]
    UnsupportedOperation(String),

    #[error("duplicate {kind} block for table '{table}'")]
    DuplicateBlock { kind: BlockKind, table: String },

    #[error("you can only create or alter tables, not '{0}'")]
    TableName(String),

    #[error("malformed statement: {0}")]
    Malformed(String),

    #[error("invalid exclusivity config: {0}")]
    InvalidExclusivityConfig(String),

    #[error("failed to read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid serialized schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the primitive value factory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("{datatype} expects {expected} type argument(s), got {found}")]
    Arity {
        datatype: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid decimal format decimal({total}, {fraction})")]
    DecimalPrecision { total: u32, fraction: u32 },

    #[error("varchar length must be positive")]
    ZeroLength,
}

/// Errors raised while generating a database
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("circular foreign key dependencies between tables: {}", tables.join(", "))]
    CircularDependency { tables: Vec<String> },

    #[error("no candidate values left for {table}.{column}")]
    EmptyChoicePool { table: String, column: String },

    #[error("invalid arguments for {table}.{column}: {source}")]
    InvalidArguments {
        table: String,
        column: String,
        #[source]
        source: SynthError,
    },

    #[error("table '{table}' references unknown table '{referenced}'")]
    UnknownTable { table: String, referenced: String },

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("failed to load preload data for '{table}': {source}")]
    Preload {
        table: String,
        #[source]
        source: csv::Error,
    },
}

/// Errors raised while writing generated tables
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error writing {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Errors raised while loading a run configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
