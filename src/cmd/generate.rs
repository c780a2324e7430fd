//! Generate command - parse a schema and write fake data for every table.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema2db::config::{ExclusiveGroup, RunConfig};
use schema2db::export::{export_db, ExportFormat};
use schema2db::generate::{GenerateOptions, Generator};
use schema2db::preload::{Preload, PreloadSource};
use schema2db::schema::{Schema, SchemaSource};
use std::path::PathBuf;
use std::time::Instant;

/// Generate command options, as given on the command line
pub struct GenerateArgs {
    pub schema: PathBuf,
    pub output: PathBuf,
    pub rows: Option<usize>,
    pub seed: Option<u64>,
    pub format: Option<ExportFormat>,
    pub preload: Vec<(String, PathBuf)>,
    pub exclusive: Vec<ExclusiveGroup>,
    pub keep_probability: Option<f64>,
    pub config: Option<PathBuf>,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let start = Instant::now();

    let config = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };

    let mut schema = Schema::load(SchemaSource::Path(args.schema.clone()))
        .with_context(|| format!("parsing schema {}", args.schema.display()))?;
    for skipped in schema.skipped_constraints() {
        eprintln!(
            "Skipped constraint on {}: {} ({})",
            skipped.table, skipped.clause, skipped.reason
        );
    }

    for group in config.exclusive.iter().chain(&args.exclusive) {
        group.apply(&mut schema).with_context(|| {
            format!("registering exclusive group [{}]", group.tables.join(", "))
        })?;
    }

    let mut options = GenerateOptions::default();
    if let Some(rows) = args.rows.or(config.rows) {
        options.rows = rows;
    }
    if let Some(keep) = args.keep_probability.or(config.keep_probability) {
        anyhow::ensure!(
            (0.0..=1.0).contains(&keep),
            "--null-keep must be between 0 and 1, got {}",
            keep
        );
        options.keep_probability = keep;
    }
    let format = args.format.or(config.format).unwrap_or_default();
    let seed = args
        .seed
        .or(config.seed)
        .unwrap_or_else(|| rand::rng().random());

    let mut preload: Preload = config
        .preload
        .into_iter()
        .map(|(table, path)| (table, PreloadSource::Path(path)))
        .collect();
    for (table, path) in args.preload {
        preload.insert(table, PreloadSource::Path(path));
    }

    eprintln!(
        "Generating {} tables ({} rows each, seed {})...",
        schema.len(),
        options.rows,
        seed
    );

    let mut generator = Generator::new(&schema, StdRng::seed_from_u64(seed)).with_options(options);
    let db = generator.generate(preload).context("generating data")?;

    let written = export_db(&db, &schema, &args.output, format)
        .with_context(|| format!("writing output to {}", args.output.display()))?;

    let total_rows: usize = db.iter().map(|(_, t)| t.len()).sum();
    eprintln!(
        "Wrote {} files ({} rows) to {} in {:.2?}",
        written.len(),
        total_rows,
        args.output.display(),
        start.elapsed()
    );
    Ok(())
}
