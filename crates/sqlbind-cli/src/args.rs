//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlbind")]
#[command(author, version, about = "Resolve SQL scripts against schema definitions")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to the nearest sqlbind.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Where the catalog comes from
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Schema definition files
    #[arg(short, long = "schema", value_name = "FILE")]
    pub schema: Vec<PathBuf>,

    /// Directory containing schema files
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Current database of the session
    #[arg(short, long, env = "SQLBIND_DATABASE")]
    pub database: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check SQL files against schema definitions
    Check {
        /// SQL files to check (supports glob patterns)
        files: Vec<PathBuf>,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Diagnostic codes to ignore (e.g. E0002)
        #[arg(long, value_name = "CODE")]
        disable: Vec<String>,

        /// Iteration cap of the resolution batch
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Print the resolved plan of every statement in a file
    Plan {
        /// SQL file to resolve
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Display schema information
    Schema {
        /// Schema definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List system variables and their values
    Vars {
        /// Show global values instead of a new session's
        #[arg(short, long)]
        global: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// SARIF output (for GitHub Code Scanning)
    Sarif,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let args = Args::parse_from([
            "sqlbind", "-vv", "check", "q.sql", "--schema", "s.sql", "-d", "app", "-f", "json",
        ]);
        assert_eq!(args.verbose, 2);
        let Command::Check {
            files,
            schema,
            format,
            ..
        } = args.command
        else {
            panic!("expected check");
        };
        assert_eq!(files, vec![PathBuf::from("q.sql")]);
        assert_eq!(schema.schema, vec![PathBuf::from("s.sql")]);
        assert_eq!(schema.database.as_deref(), Some("app"));
        assert_eq!(format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("SARIF".parse::<OutputFormat>(), Ok(OutputFormat::Sarif));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
