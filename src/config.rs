//! YAML configuration for the generate command.
//!
//! Every setting is optional; command-line flags take precedence over the
//! file.

use crate::error::{ConfigError, SchemaError};
use crate::export::ExportFormat;
use crate::schema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A set of tables that must not share values in the given columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExclusiveGroup {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
}

impl ExclusiveGroup {
    /// Register this group on `schema`
    pub fn apply(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        schema.register_exclusivity(&self.tables, &self.columns)
    }
}

impl FromStr for ExclusiveGroup {
    type Err = String;

    /// Parse `t1,t2:col1,col2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tables, columns) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid exclusive group '{}'. Expected tables:columns", s))?;
        let split = |list: &str| -> Vec<String> {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        };

        let group = ExclusiveGroup {
            tables: split(tables),
            columns: split(columns),
        };
        if group.tables.len() < 2 {
            return Err(format!("Exclusive group '{}' needs at least two tables", s));
        }
        if group.columns.is_empty() {
            return Err(format!("Exclusive group '{}' needs at least one column", s));
        }
        Ok(group)
    }
}

/// Complete YAML configuration for a generate run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Target rows per generated table
    pub rows: Option<usize>,
    /// Seed for the random source
    pub seed: Option<u64>,
    /// Survival probability for values of NULL-able columns
    pub keep_probability: Option<f64>,
    pub format: Option<ExportFormat>,
    /// CSV files to load instead of generating, keyed by table
    pub preload: IndexMap<String, PathBuf>,
    pub exclusive: Vec<ExclusiveGroup>,
}

impl RunConfig {
    /// Load configuration from a YAML file.
    ///
    /// Relative preload paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: RunConfig =
            serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(base) = path.parent() {
            for file in config.preload.values_mut() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text, without path resolution
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_yaml_ng::from_str(content).map_err(|source| {
            ConfigError::Yaml {
                path: PathBuf::from("<string>"),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(p) = self.keep_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "keep_probability must be between 0 and 1, got {}",
                    p
                )));
            }
        }
        for group in &self.exclusive {
            if group.columns.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "exclusive group [{}] has no columns",
                    group.tables.join(", ")
                )));
            }
        }
        Ok(())
    }
}
