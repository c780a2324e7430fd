//! DDL parsing for schema extraction.
//!
//! Parses `CREATE TABLE` and `ALTER TABLE ... ADD CONSTRAINT` blocks to extract:
//! - Column definitions with types, signedness, nullability and defaults
//! - Primary key declarations
//! - Foreign key and enum check constraints
//!
//! The input is line oriented: statements end with `;` followed by a newline,
//! one column or constraint per line.

use super::constraint::{parse_clause, Constraint, ConstraintLine};
use super::{ColumnDef, DataType, Schema, SkippedConstraint, TableDef};
use crate::error::{BlockKind, SchemaError};
use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Letters prefix of a datatype token (`varchar(255)` -> `varchar`)
static TYPE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").unwrap());

/// Digit runs of a datatype token (`decimal(10,2)` -> `10`, `2`)
static TYPE_ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_$]*").unwrap());

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnot\s+null\b").unwrap());

static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnull\b").unwrap());

static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bprimary\s+key\b").unwrap());

static LEADING_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^primary\s+key\b").unwrap());

static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^foreign\s+key\b").unwrap());

static CHECK_CLAUSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^check\s*\(").unwrap());

/// `KEY name (`, `UNIQUE INDEX (`, `UNIQUE (`; the optional name is captured
static INDEX_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:unique\s*\(|(?:(?:unique|fulltext|spatial)\s+)?(?:key|index)\b\s*(?:`?([A-Za-z_][A-Za-z0-9_$]*)`?\s*)?\()",
    )
    .unwrap()
});

/// Parse a whole DDL document into a schema
pub fn parse_schema(doc: &str) -> Result<Schema, SchemaError> {
    let cleaned = clean_document(doc);
    let mut builder = SchemaBuilder::new();
    for block in split_blocks(&cleaned) {
        builder.parse_block(block)?;
    }
    Ok(builder.build())
}

/// Drop comment and blank lines, collapse whitespace inside each line
pub fn clean_document(doc: &str) -> String {
    doc.lines()
        .filter(|line| {
            let first = line.split_whitespace().next();
            matches!(first, Some(token) if !token.starts_with("--"))
        })
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a cleaned document into statement blocks on `;` + newline
pub fn split_blocks(cleaned: &str) -> Vec<&str> {
    cleaned
        .split(";\n")
        .map(|block| block.trim().trim_end_matches(';').trim_end())
        .filter(|block| !block.is_empty())
        .collect()
}

/// Builder for constructing a schema from DDL blocks
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
    altered: AHashSet<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a block by its leading keyword and parse it
    pub fn parse_block(&mut self, block: &str) -> Result<(), SchemaError> {
        let operation = block
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match operation.as_str() {
            "create" => self.parse_create_table(block),
            "alter" => self.parse_alter_table(block),
            _ => Err(SchemaError::UnsupportedOperation(operation)),
        }
    }

    /// Parse a CREATE TABLE block and add it to the schema
    pub fn parse_create_table(&mut self, block: &str) -> Result<(), SchemaError> {
        let mut lines = block.lines();
        let header = lines.next().unwrap_or_default();
        let name = table_name(header)?;

        if self.schema.tables.contains_key(&name) {
            return Err(SchemaError::DuplicateBlock {
                kind: BlockKind::Create,
                table: name,
            });
        }

        let mut table = TableDef::new(name.clone());
        let mut declared_pk: Vec<String> = Vec::new();

        // Column text sharing the header line: `CREATE TABLE t (id int,`
        let inline_body = header
            .find('(')
            .map(|i| header[i + 1..].trim())
            .filter(|rest| !rest.is_empty());

        for line in inline_body.into_iter().chain(lines) {
            let line = trim_line_terminator(line);
            if !line.chars().any(|c| c.is_ascii_alphabetic()) {
                continue;
            }

            let has_pk = PRIMARY_KEY_RE.is_match(line);

            match classify_body_line(line) {
                BodyLine::PrimaryKey => declared_pk.extend(parse_primary_key(line)),
                BodyLine::Constraint => self.add_constraint(&name, line),
                BodyLine::Index => {
                    debug!(table = %name, line, "ignoring index declaration");
                }
                BodyLine::Column => match parse_column(line) {
                    Some(column) => {
                        if has_pk {
                            declared_pk.push(column.name.clone());
                        }
                        table.columns.push(column);
                    }
                    None => warn!(table = %name, line, "skipping malformed column line"),
                },
            }
        }

        for pk in declared_pk {
            if table.get_column(&pk).is_none() {
                warn!(table = %name, column = %pk, "primary key names an undeclared column");
            } else if !table.is_pk_column(&pk) {
                table.primary_key.push(pk);
            }
        }

        self.schema.add_table(table);
        Ok(())
    }

    /// Parse an ALTER TABLE block; malformed constraint clauses are skipped
    pub fn parse_alter_table(&mut self, block: &str) -> Result<(), SchemaError> {
        let mut lines = block.lines();
        let header = lines.next().unwrap_or_default();
        let name = table_name(header)?;

        if !self.altered.insert(name.clone()) {
            return Err(SchemaError::DuplicateBlock {
                kind: BlockKind::Alter,
                table: name,
            });
        }

        // `ALTER TABLE t ADD CONSTRAINT ...` on a single line
        let header_rest = header
            .split_whitespace()
            .skip(3)
            .collect::<Vec<_>>()
            .join(" ");
        let header_rest = (!header_rest.is_empty()).then_some(header_rest);

        for line in header_rest.iter().map(String::as_str).chain(lines) {
            let line = line.trim();
            if !line.chars().any(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            self.add_constraint(&name, line);
        }

        Ok(())
    }

    fn add_constraint(&mut self, table: &str, clause: &str) {
        match parse_clause(clause) {
            ConstraintLine::Parsed { constraint, .. } => match constraint {
                Constraint::ForeignKey(fk) => self.schema.add_foreign_key(table, fk),
                Constraint::EnumCheck(check) => self.schema.add_check(table, check),
            },
            ConstraintLine::Skipped(reason) => {
                warn!(table, clause, reason = %reason, "skipping constraint clause");
                self.schema.skipped.push(SkippedConstraint {
                    table: table.to_string(),
                    clause: clause.to_string(),
                    reason,
                });
            }
        }
    }

    pub fn build(self) -> Schema {
        self.schema
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Table name from a `CREATE TABLE <name>` / `ALTER TABLE <name>` line
fn table_name(line: &str) -> Result<String, SchemaError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let kind = words.get(1).copied().unwrap_or_default();
    if !kind.eq_ignore_ascii_case("table") {
        return Err(SchemaError::TableName(kind.to_string()));
    }

    let raw = words.get(2).copied().unwrap_or_default();
    let name = strip_quotes(raw.split('(').next().unwrap_or_default());
    if name.is_empty() {
        return Err(SchemaError::Malformed(format!("missing table name in '{}'", line)));
    }
    Ok(name)
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

/// Strip a trailing `,` / `;` and any unbalanced closing parentheses
fn trim_line_terminator(line: &str) -> &str {
    let mut line = line.trim().trim_end_matches([',', ';']).trim_end();
    while line.ends_with(')') && line.matches(')').count() > line.matches('(').count() {
        line = line[..line.len() - 1].trim_end().trim_end_matches(',');
    }
    line
}

/// What a line of a CREATE body declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyLine {
    PrimaryKey,
    Constraint,
    Index,
    Column,
}

/// Classify a body line by its shape, so columns named `key`, `index` or
/// `check` stay columns
fn classify_body_line(line: &str) -> BodyLine {
    if LEADING_PRIMARY_KEY_RE.is_match(line) {
        return BodyLine::PrimaryKey;
    }
    if FOREIGN_KEY_RE.is_match(line) || CHECK_CLAUSE_RE.is_match(line) {
        return BodyLine::Constraint;
    }

    let mut tokens = line.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    if first.eq_ignore_ascii_case("constraint") && !tokens.next().is_some_and(is_type_token) {
        return if PRIMARY_KEY_RE.is_match(line) {
            BodyLine::PrimaryKey
        } else {
            BodyLine::Constraint
        };
    }

    if let Some(caps) = INDEX_DECL_RE.captures(line) {
        // `key varchar(10)` is a column whose type takes arguments
        if !caps.get(1).is_some_and(|m| is_type_token(m.as_str())) {
            return BodyLine::Index;
        }
    }
    BodyLine::Column
}

/// Whether `token` is a supported type name, with or without arguments
fn is_type_token(token: &str) -> bool {
    let name = token.split('(').next().unwrap_or_default();
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphabetic())
        && !matches!(DataType::from_name(name), DataType::Other(_))
}

/// Column names of a `PRIMARY KEY (a, b)` declaration, in clause order
fn parse_primary_key(line: &str) -> Vec<String> {
    let lower = line.to_ascii_lowercase();
    let after = PRIMARY_KEY_RE
        .find(&lower)
        .map(|m| &line[m.end()..])
        .unwrap_or(line);

    match after.find('(') {
        Some(open) => {
            let inner = &after[open + 1..];
            let inner = inner.find(')').map(|close| &inner[..close]).unwrap_or(inner);
            IDENT_RE
                .find_iter(inner)
                .map(|m| m.as_str().to_string())
                .collect()
        }
        None => IDENT_RE
            .find_iter(after)
            .map(|m| m.as_str())
            .filter(|t| !t.eq_ignore_ascii_case("primary") && !t.eq_ignore_ascii_case("key"))
            .map(str::to_string)
            .collect(),
    }
}

/// Parse `name type[(args)] [SIGNED|UNSIGNED] [NULL|NOT NULL] [DEFAULT v]`
fn parse_column(line: &str) -> Option<ColumnDef> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let name = strip_quotes(tokens.first()?);
    if name.is_empty() {
        return None;
    }

    // Re-join a type token whose argument list contains spaces: `decimal(10, 2)`
    let mut type_str = tokens.get(1)?.to_string();
    let mut next = 2;
    while type_str.matches('(').count() > type_str.matches(')').count() && next < tokens.len() {
        type_str.push_str(tokens[next]);
        next += 1;
    }

    let type_name = TYPE_NAME_RE.find(&type_str)?.as_str();
    let datatype = DataType::from_name(type_name);
    let type_args: Vec<u32> = TYPE_ARGS_RE
        .find_iter(&type_str)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let signed = match tokens.get(next).map(|t| t.to_ascii_lowercase()) {
        Some(t) if t == "signed" => {
            next += 1;
            Some(true)
        }
        Some(t) if t == "unsigned" => {
            next += 1;
            Some(false)
        }
        _ => None,
    };

    let rest = &tokens[next.min(tokens.len())..];
    let rest_text = rest.join(" ");
    let nullable = if NOT_NULL_RE.is_match(&rest_text) {
        Some(false)
    } else if NULL_RE.is_match(&rest_text) {
        Some(true)
    } else {
        None
    };

    let default = rest
        .iter()
        .position(|t| t.eq_ignore_ascii_case("default"))
        .and_then(|idx| rest.get(idx + 1))
        .map(|v| v.to_string());

    Some(ColumnDef {
        name,
        datatype,
        type_args,
        signed,
        nullable,
        default,
    })
}
