//! Column candidate domains and exclusivity narrowing.

use super::table::GeneratedDatabase;
use crate::error::GenerateError;
use crate::schema::{ColumnDef, DataType, Schema, TableDef};
use crate::value::Value;
use ahash::AHashSet;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Candidate values for a column
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// Enum values or a referential value pool (duplicates kept)
    Bounded(Vec<Value>),
    /// Anything the synthesizer produces for the column type
    Unbounded,
}

/// Values already committed by processed exclusivity peers
#[derive(Debug, Default)]
pub struct Exclusion {
    pub values: AHashSet<Value>,
    /// Peers of the group not generated yet
    pub unprocessed_peers: usize,
}

/// Resolve a column's domain: enum check first, then foreign key, else unbounded
pub fn candidate_domain(
    schema: &Schema,
    table: &TableDef,
    column: &ColumnDef,
    db: &GeneratedDatabase,
) -> Result<Domain, GenerateError> {
    if let Some(check) = schema.check(&table.name, &column.name) {
        let values = check
            .allowed_values
            .iter()
            .map(|v| Value::parse_as(&column.datatype, v))
            .collect();
        return Ok(Domain::Bounded(values));
    }

    if let Some(fk) = schema.foreign_key(&table.name, &column.name) {
        let parent = db
            .get(&fk.referenced_table)
            .ok_or_else(|| GenerateError::UnknownTable {
                table: table.name.clone(),
                referenced: fk.referenced_table.clone(),
            })?;
        let pool = parent
            .column_values(&fk.referenced_column)
            .ok_or_else(|| GenerateError::UnknownColumn {
                table: fk.referenced_table.clone(),
                column: fk.referenced_column.clone(),
            })?
            .map(|v| coerce(column, v))
            .filter(|v| !v.is_blank())
            .collect();
        return Ok(Domain::Bounded(pool));
    }

    Ok(Domain::Unbounded)
}

/// Exclusion set for `table.column` if the column is exclusivity-bound.
///
/// Only peers already present in `db` contribute values; schema tables that
/// have not run yet are counted so the remaining domain can be split with
/// them. Peers that will never run are ignored.
pub fn peer_exclusion(
    schema: &Schema,
    table: &TableDef,
    column: &ColumnDef,
    db: &GeneratedDatabase,
) -> Option<Exclusion> {
    let spec = schema.exclusivity_for(&table.name)?;
    if !spec.shared_columns.contains(&column.name) {
        return None;
    }

    let mut exclusion = Exclusion::default();
    for peer in &spec.peer_tables {
        match db.get(peer) {
            Some(generated) => {
                if let Some(values) = generated.column_values(&column.name) {
                    exclusion.values.extend(
                        values
                            .map(|v| coerce(column, v))
                            .filter(|v| !v.is_blank()),
                    );
                }
            }
            None if schema.get_table(peer).is_some() => exclusion.unprocessed_peers += 1,
            None => {}
        }
    }
    Some(exclusion)
}

/// Re-read a value committed elsewhere as the consuming column's type.
///
/// Text is parsed for typed columns; typed values become text for text
/// columns. Text staying text is kept untouched, spaces included.
fn coerce(column: &ColumnDef, value: &Value) -> Value {
    match (value, &column.datatype) {
        (Value::Blank, _) | (Value::Text(_), DataType::Varchar | DataType::Other(_)) => {
            value.clone()
        }
        (Value::Text(raw), datatype) => Value::parse_as(datatype, raw),
        (_, DataType::Varchar | DataType::Other(_)) => Value::Text(value.to_string()),
        _ => value.clone(),
    }
}

/// Remove committed peer values from a bounded domain, then keep a random
/// `len / (unprocessed_peers + 1)` share (at least one value) so peers that
/// run later still find candidates.
pub fn narrow<R: Rng + ?Sized>(rng: &mut R, domain: Vec<Value>, exclusion: &Exclusion) -> Vec<Value> {
    let remaining: Vec<Value> = domain
        .into_iter()
        .filter(|v| !exclusion.values.contains(v))
        .collect();

    if exclusion.unprocessed_peers == 0 || remaining.is_empty() {
        return remaining;
    }

    let share = (remaining.len() / (exclusion.unprocessed_peers + 1)).max(1);
    remaining.choose_multiple(rng, share).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_narrow_partitions_for_unprocessed_peers() {
        let mut rng = StdRng::seed_from_u64(9);
        let domain: Vec<Value> = (0..10).map(Value::Int).collect();
        let exclusion = Exclusion {
            values: [Value::Int(0), Value::Int(1)].into_iter().collect(),
            unprocessed_peers: 1,
        };

        let narrowed = narrow(&mut rng, domain, &exclusion);
        assert_eq!(narrowed.len(), 4);
        assert!(narrowed.iter().all(|v| !exclusion.values.contains(v)));
    }

    #[test]
    fn test_coerce_follows_column_type() {
        let int = ColumnDef::new("n", DataType::Int);
        let text = ColumnDef::new("s", DataType::Varchar).args(&[4]);

        assert_eq!(coerce(&int, &Value::Text("5".into())), Value::Int(5));
        assert_eq!(coerce(&int, &Value::Text(" ".into())), Value::Blank);
        assert_eq!(coerce(&text, &Value::Int(7)), Value::Text("7".into()));
        assert_eq!(coerce(&text, &Value::Text(" a ".into())), Value::Text(" a ".into()));
    }

    #[test]
    fn test_narrow_keeps_at_least_one() {
        let mut rng = StdRng::seed_from_u64(10);
        let exclusion = Exclusion {
            values: AHashSet::new(),
            unprocessed_peers: 5,
        };
        assert_eq!(narrow(&mut rng, vec![Value::Int(1)], &exclusion).len(), 1);
    }
}
