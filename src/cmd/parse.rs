//! Parse command - print the schema model as JSON or canonical DDL.

use super::ParseFormat;
use anyhow::{Context, Result};
use schema2db::schema::{Schema, SchemaSource};
use std::path::PathBuf;

pub fn run(file: PathBuf, format: ParseFormat) -> Result<()> {
    let schema = Schema::load(SchemaSource::Path(file.clone()))
        .with_context(|| format!("parsing schema {}", file.display()))?;

    match format {
        ParseFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
        ParseFormat::Ddl => print!("{}", schema.to_ddl()),
    }

    for skipped in schema.skipped_constraints() {
        eprintln!(
            "Skipped constraint on {}: {} ({})",
            skipped.table, skipped.clause, skipped.reason
        );
    }
    Ok(())
}
