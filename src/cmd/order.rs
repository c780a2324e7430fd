//! Order command - print the table generation order.

use anyhow::{Context, Result};
use schema2db::schema::{processing_order, Schema, SchemaSource};
use std::path::PathBuf;

pub fn run(file: PathBuf, preload: Vec<String>) -> Result<()> {
    let schema = Schema::load(SchemaSource::Path(file.clone()))
        .with_context(|| format!("parsing schema {}", file.display()))?;

    if schema.is_empty() {
        eprintln!("No tables found in the file.");
        return Ok(());
    }

    let order = processing_order(&schema, &preload)?;

    eprintln!("Generation order ({} tables):", order.len());
    for (i, table) in order.iter().enumerate() {
        println!("{}. {}", i + 1, table);
    }
    Ok(())
}
