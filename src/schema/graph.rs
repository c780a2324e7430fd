//! Schema dependency graph for FK-ordered generation.
//!
//! Provides:
//! - Dependency graph construction from declared foreign keys
//! - Pass-based processing order (parents before children)
//! - Cycle detection: a pass that commits nothing is a cycle

use super::Schema;
use crate::error::GenerateError;
use ahash::AHashSet;
use indexmap::IndexMap;
use tracing::debug;

/// Table dependency graph built from foreign key relationships.
///
/// A parent is a table referenced by another table's FK. Processing parents
/// before children guarantees every FK value pool exists when a child is
/// generated.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// For each table (declaration order), the tables it references
    parents: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a dependency graph from a schema
    pub fn from_schema(schema: &Schema) -> Self {
        let parents = schema
            .table_names()
            .map(|name| {
                let refs = schema
                    .referenced_tables(name)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (name.to_string(), refs)
            })
            .collect();
        Self { parents }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Tables `table` references via FK
    pub fn parents(&self, table: &str) -> &[String] {
        self.parents.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tables that reference `table` via FK
    pub fn children(&self, table: &str) -> Vec<&str> {
        self.parents
            .iter()
            .filter(|(_, parents)| parents.iter().any(|p| p == table))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Check if a table has a self-referential FK
    pub fn has_self_reference(&self, table: &str) -> bool {
        self.parents(table).iter().any(|p| p == table)
    }

    /// Order in which tables are generated.
    ///
    /// Starts from every non-preloaded table in declaration order and scans
    /// the work list once per pass. A table whose parents are all done is
    /// committed immediately (so later candidates in the same pass see it);
    /// the rest wait for the next pass. A pass with no commits means the
    /// remaining tables form or depend on a cycle.
    pub fn processing_order<S: AsRef<str>>(
        &self,
        preloaded: &[S],
    ) -> Result<Vec<String>, GenerateError> {
        let mut done: AHashSet<&str> = preloaded.iter().map(|p| p.as_ref()).collect();

        let mut pending: Vec<&str> = self
            .parents
            .keys()
            .map(String::as_str)
            .filter(|name| !done.contains(name))
            .collect();

        for table in &pending {
            for parent in self.parents(table) {
                if !self.parents.contains_key(parent) && !done.contains(parent.as_str()) {
                    return Err(GenerateError::UnknownTable {
                        table: table.to_string(),
                        referenced: parent.clone(),
                    });
                }
            }
        }

        let mut order = Vec::with_capacity(pending.len());
        let mut pass = 0usize;

        while !pending.is_empty() {
            pass += 1;
            let start_count = pending.len();
            let mut waiting = Vec::new();

            for table in pending {
                if self.parents(table).iter().all(|p| done.contains(p.as_str())) {
                    done.insert(table);
                    order.push(table.to_string());
                } else {
                    waiting.push(table);
                }
            }

            debug!(
                pass,
                committed = start_count - waiting.len(),
                waiting = waiting.len(),
                "dependency pass"
            );

            if waiting.len() == start_count {
                return Err(GenerateError::CircularDependency {
                    tables: waiting.into_iter().map(str::to_string).collect(),
                });
            }
            pending = waiting;
        }

        Ok(order)
    }
}

/// Processing order for `schema`, treating `preloaded` tables as already done
pub fn processing_order<S: AsRef<str>>(
    schema: &Schema,
    preloaded: &[S],
) -> Result<Vec<String>, GenerateError> {
    DependencyGraph::from_schema(schema).processing_order(preloaded)
}
