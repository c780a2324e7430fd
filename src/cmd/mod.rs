mod generate;
mod order;
mod parse;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate as generate_completions, Shell};
use schema2db::config::ExclusiveGroup;
use schema2db::export::ExportFormat;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schema2db")]
#[command(version)]
#[command(about = "Generate constraint-consistent fake data from SQL DDL", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format of the parse command
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ParseFormat {
    #[default]
    Json,
    Ddl,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one data file per table from a DDL schema
    Generate {
        /// Schema file (.sql DDL or .json serialized schema)
        schema: PathBuf,

        /// Output directory for generated files
        output: PathBuf,

        /// Target rows per table (default: 50)
        #[arg(short, long)]
        rows: Option<usize>,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: csv or sql (default: csv)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Load a table from CSV instead of generating it (table=path, repeatable)
        #[arg(long, value_parser = parse_preload)]
        preload: Vec<(String, PathBuf)>,

        /// Tables that must not share column values (t1,t2:col1,col2, repeatable)
        #[arg(long)]
        exclusive: Vec<ExclusiveGroup>,

        /// Probability that a value of a NULL-able column is kept (default: 0.8)
        #[arg(long)]
        null_keep: Option<f64>,

        /// YAML config file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse a schema and print the table/constraint model
    Parse {
        /// Schema file (.sql DDL or .json serialized schema)
        schema: PathBuf,

        /// Output format: json or ddl
        #[arg(short, long, value_enum, default_value_t)]
        format: ParseFormat,
    },

    /// Print the order in which tables would be generated
    Order {
        /// Schema file (.sql DDL or .json serialized schema)
        schema: PathBuf,

        /// Tables treated as already loaded (repeatable)
        #[arg(long)]
        preload: Vec<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_preload(s: &str) -> Result<(String, PathBuf), String> {
    let (table, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid preload '{}'. Expected table=path", s))?;
    let table = table.trim();
    if table.is_empty() || path.trim().is_empty() {
        return Err(format!("Invalid preload '{}'. Expected table=path", s));
    }
    Ok((table.to_string(), PathBuf::from(path.trim())))
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            output,
            rows,
            seed,
            format,
            preload,
            exclusive,
            null_keep,
            config,
        } => generate::run(generate::GenerateArgs {
            schema,
            output,
            rows,
            seed,
            format,
            preload,
            exclusive,
            keep_probability: null_keep,
            config,
        }),
        Commands::Parse { schema, format } => parse::run(schema, format),
        Commands::Order { schema, preload } => order::run(schema, preload),
        Commands::Completions { shell } => {
            generate_completions(shell, &mut Cli::command(), "schema2db", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preload() {
        assert_eq!(
            parse_preload("users=data/users.csv").unwrap(),
            ("users".to_string(), PathBuf::from("data/users.csv"))
        );
        assert!(parse_preload("users").is_err());
        assert!(parse_preload("=x.csv").is_err());
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "schema2db",
            "generate",
            "schema.sql",
            "out",
            "--rows",
            "10",
            "--format",
            "sql",
            "--exclusive",
            "a,b:id",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                rows,
                format,
                exclusive,
                ..
            } => {
                assert_eq!(rows, Some(10));
                assert_eq!(format, Some(ExportFormat::Sql));
                assert_eq!(exclusive.len(), 1);
            }
            _ => panic!("expected generate"),
        }
    }
}
