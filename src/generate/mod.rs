//! Constraint-aware table generation.
//!
//! Tables are generated in dependency order so every foreign key column can
//! draw from values its parent table already committed. Columns are filled
//! one at a time in declaration order:
//!
//! - enum checks and foreign keys give a bounded domain that is sampled
//! - everything else is synthesized from the column type
//! - primary key columns never repeat a value
//! - exclusivity peers never share values in their shared columns
//!
//! Columns may end up shorter than requested; the table is cut to the
//! shortest column.

mod domain;
mod table;

pub use domain::{candidate_domain, narrow, peer_exclusion, Domain, Exclusion};
pub use table::{GeneratedDatabase, GeneratedTable, TableBuilder};

use crate::error::GenerateError;
use crate::preload::{self, Preload};
use crate::schema::{processing_order, ColumnDef, DataType, Schema, TableDef};
use crate::synth::{self, DEFAULT_KEEP_PROBABILITY};
use crate::value::Value;
use ahash::AHashSet;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

/// Rows requested per table when nothing else is configured
pub const DEFAULT_ROWS: usize = 50;

/// Generation knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    /// Target rows per generated table; bounded columns may lower it
    pub rows: usize,
    /// Survival probability of synthesized values in NULL-able columns
    pub keep_probability: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            keep_probability: DEFAULT_KEEP_PROBABILITY,
        }
    }
}

/// Generates a database for one schema from an owned random source
pub struct Generator<'s, R> {
    schema: &'s Schema,
    options: GenerateOptions,
    rng: R,
}

impl<'s, R: Rng> Generator<'s, R> {
    pub fn new(schema: &'s Schema, rng: R) -> Self {
        Self {
            schema,
            options: GenerateOptions::default(),
            rng,
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate every non-preloaded table.
    ///
    /// Preloaded tables are committed first, unchanged, and count as already
    /// processed for ordering, foreign key pools and exclusivity. Any error
    /// aborts the whole run.
    pub fn generate(&mut self, preload: Preload) -> Result<GeneratedDatabase, GenerateError> {
        let schema = self.schema;
        let mut db = GeneratedDatabase::new();
        for (name, table) in preload::resolve(preload, schema)? {
            debug!(table = %name, rows = table.len(), "preloaded table");
            db.insert(name, table);
        }

        for (table, spec) in &schema.exclusivity {
            for peer in &spec.peer_tables {
                if schema.get_table(peer).is_none() && db.get(peer).is_none() {
                    warn!(table = %table, peer = %peer, "exclusivity peer is neither a schema table nor preloaded, ignoring it");
                }
            }
        }

        let preloaded: Vec<String> = db.table_names().map(str::to_string).collect();
        let order = processing_order(schema, &preloaded)?;
        info!(tables = order.len(), preloaded = preloaded.len(), "generation order resolved");

        for name in &order {
            let Some(table) = schema.get_table(name) else {
                continue;
            };
            let generated = self.generate_table(table, &db)?;
            debug!(table = %name, rows = generated.len(), "table committed");
            db.insert(name.clone(), generated);
        }

        Ok(db)
    }

    /// Generate one table against the tables already in `db`
    pub fn generate_table(
        &mut self,
        table: &TableDef,
        db: &GeneratedDatabase,
    ) -> Result<GeneratedTable, GenerateError> {
        let mut rows = self.options.rows;
        let mut builder = TableBuilder::new(&table.name);

        for column in &table.columns {
            let values = self.generate_column(table, column, db, &mut rows)?;
            builder.push_column(&column.name, values);
        }

        Ok(builder.build())
    }

    fn generate_column(
        &mut self,
        table: &TableDef,
        column: &ColumnDef,
        db: &GeneratedDatabase,
        rows: &mut usize,
    ) -> Result<Vec<Value>, GenerateError> {
        let is_pk = table.is_pk_column(&column.name);
        let exclusion = peer_exclusion(self.schema, table, column, db);

        let mut domain = candidate_domain(self.schema, table, column, db)?;
        if let (Domain::Bounded(values), Some(exclusion)) = (&mut domain, &exclusion) {
            *values = narrow(&mut self.rng, std::mem::take(values), exclusion);
        }

        let mut values = match domain {
            Domain::Bounded(pool) => {
                if pool.is_empty() {
                    return Err(GenerateError::EmptyChoicePool {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                self.sample_bounded(pool, is_pk, rows)
            }
            Domain::Unbounded => {
                let synthesized = self.synthesize(table, column, is_pk, *rows)?;
                if !is_pk && column.nullable == Some(true) {
                    let keep = self.options.keep_probability;
                    synthesized
                        .into_iter()
                        .map(|v| synth::gen_null(&mut self.rng, v, keep))
                        .collect()
                } else {
                    synthesized
                }
            }
        };

        if let Some(exclusion) = exclusion.filter(|e| !e.values.is_empty()) {
            values.retain(|v| !exclusion.values.contains(v));
        }
        Ok(values)
    }

    /// Draw from a bounded domain, lowering `rows` to what the domain allows
    fn sample_bounded(&mut self, pool: Vec<Value>, is_pk: bool, rows: &mut usize) -> Vec<Value> {
        if is_pk {
            let distinct = dedup(pool);
            *rows = (*rows).min(distinct.len());
            distinct
                .choose_multiple(&mut self.rng, *rows)
                .cloned()
                .collect()
        } else {
            *rows = (*rows).min(pool.len());
            (0..*rows)
                .filter_map(|_| pool.choose(&mut self.rng).cloned())
                .collect()
        }
    }

    fn synthesize(
        &mut self,
        table: &TableDef,
        column: &ColumnDef,
        is_pk: bool,
        rows: usize,
    ) -> Result<Vec<Value>, GenerateError> {
        let invalid = |source| GenerateError::InvalidArguments {
            table: table.name.clone(),
            column: column.name.clone(),
            source,
        };

        if !is_pk {
            return synth::random_list(&mut self.rng, column, rows).map_err(invalid);
        }

        // Oversample, then drop collisions
        let mut candidates = synth::random_list(&mut self.rng, column, rows * 2).map_err(invalid)?;
        if column.datatype == DataType::Varchar {
            for value in &mut candidates {
                if let Value::Text(text) = value {
                    text.retain(|c| !c.is_whitespace());
                }
            }
            // Text made only of spaces strips to nothing
            candidates.retain(|v| !matches!(v, Value::Text(t) if t.is_empty()));
        }
        let mut distinct = dedup(candidates);
        distinct.truncate(rows);
        Ok(distinct)
    }
}

/// Remove repeated values, keeping first occurrences in order
fn dedup(values: Vec<Value>) -> Vec<Value> {
    let mut seen = AHashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
