//! Configuration file handling

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use sqlbind_core::{GlobalVariables, Value};

use crate::args::{OutputFormat, SchemaArgs};

pub const CONFIG_FILE_NAME: &str = "sqlbind.toml";

/// Configuration for sqlbind
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema file paths or patterns
    #[serde(default)]
    pub schema: Vec<String>,

    /// Schema directory
    pub schema_dir: Option<String>,

    /// Query file patterns to check
    #[serde(default)]
    pub files: Vec<String>,

    /// Output format (human, json, sarif)
    #[serde(default)]
    pub format: Option<String>,

    /// Diagnostic codes to disable (e.g., ["E0002"])
    #[serde(default)]
    pub disable: Vec<String>,

    /// Current database of the checking session
    pub database: Option<String>,

    /// Iteration cap of the resolution batch
    pub max_iterations: Option<usize>,

    /// Global system variable overrides applied at startup
    #[serde(default)]
    pub variables: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load sqlbind.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let current_dir = std::env::current_dir().into_diagnostic()?;
        match find_config_file(&current_dir) {
            Some(path) => Ok(Some(Self::from_file(&path)?)),
            None => Ok(None),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        schema: &SchemaArgs,
        files: &[PathBuf],
        format: Option<OutputFormat>,
        disable: &[String],
        max_iterations: Option<usize>,
    ) -> Self {
        if !schema.schema.is_empty() {
            self.schema = schema.schema.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(dir) = &schema.schema_dir {
            self.schema_dir = Some(dir.display().to_string());
        }

        if schema.database.is_some() {
            self.database = schema.database.clone();
        }

        if !files.is_empty() {
            self.files = files.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if !disable.is_empty() {
            self.disable = disable.to_vec();
        }

        if max_iterations.is_some() {
            self.max_iterations = max_iterations;
        }

        self
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        match &self.format {
            Some(fmt) => fmt.parse().map_err(|e: String| miette::miette!(e)),
            None => Ok(OutputFormat::Human),
        }
    }

    /// Apply `[variables]` to the global variable table
    pub fn apply_variables(&self, globals: &GlobalVariables) -> Result<()> {
        for (name, value) in &self.variables {
            let value = toml_to_value(value)
                .ok_or_else(|| miette::miette!("unsupported value for variable {}", name))?;
            globals.set_global(name, value).into_diagnostic()?;
        }
        Ok(())
    }
}

fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.exists())
}

fn toml_to_value(value: &toml::Value) -> Option<Value> {
    match value {
        toml::Value::String(s) => Some(Value::Text(s.clone())),
        toml::Value::Integer(i) => Some(Value::Int64(*i)),
        toml::Value::Float(f) => Some(Value::Float64(*f)),
        toml::Value::Boolean(b) => Some(Value::Boolean(*b)),
        _ => None,
    }
}
