//! Cell values shared by the synthesizer, generator, preload loader and exporter.

use crate::schema::DataType;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Date format used for parsing and rendering `date` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single generated (or preloaded) cell.
///
/// Decimals are kept in their canonical text form so values stay hashable;
/// exclusivity and primary-key deduplication compare values by equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// The blank marker produced by null injection or an empty CSV cell
    Blank,
    Int(i64),
    Decimal(String),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Coerce a raw literal through a column datatype.
    ///
    /// Empty input becomes `Blank`; anything that does not parse as the
    /// requested type is kept as text rather than rejected.
    pub fn parse_as(datatype: &DataType, raw: &str) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Blank;
        }
        match datatype {
            DataType::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            DataType::Decimal => {
                if is_decimal_literal(raw) {
                    Value::Decimal(raw.to_string())
                } else {
                    Value::Text(raw.to_string())
                }
            }
            DataType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Value::Date)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            DataType::Varchar | DataType::Other(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    /// Whether the value is rendered inside single quotes in SQL output
    pub fn is_quoted(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Date(_))
    }

    /// Render as a SQL literal (text and dates quoted, numbers bare)
    pub fn to_sql(&self) -> String {
        match self {
            Value::Blank => "NULL".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Decimal(d) => d.clone(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Decimal(d) => f.write_str(d),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Blank => serializer.serialize_none(),
            Value::Int(n) => serializer.serialize_i64(*n),
            other => serializer.collect_str(other),
        }
    }
}

fn is_decimal_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_ok = parts
        .next()
        .map(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(true);
    !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit()) && frac_ok
}
