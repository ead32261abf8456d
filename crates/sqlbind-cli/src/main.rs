//! sqlbind CLI - resolve SQL scripts against schema definitions

mod args;
mod config;
mod output;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqlbind_core::schema::DEFAULT_DATABASE;
use sqlbind_core::{Analyzer, Catalog, Engine, SchemaBuilder, Severity};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, OutputFormat, SchemaArgs};
use crate::config::Config;
use crate::output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the core crate's level
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "sqlbind_core=debug,warn",
        (false, _) => "sqlbind_core=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::find_and_load()?.unwrap_or_default()),
    }
}

fn run(args: Args) -> Result<bool> {
    let config = load_config(args.config.as_deref())?;
    let quiet = args.quiet;

    match args.command {
        Command::Check {
            files,
            schema,
            format,
            disable,
            max_iterations,
        } => {
            let config = config.merge_with_args(&schema, &files, format, &disable, max_iterations);
            check(&config, quiet)
        }

        Command::Plan { file, schema } => {
            let config = config.merge_with_args(&schema, &[], None, &[], None);
            plan(&config, &file)
        }

        Command::Schema { files } => {
            let config = config.merge_with_args(
                &SchemaArgs {
                    schema: files,
                    ..SchemaArgs::default()
                },
                &[],
                None,
                &[],
                None,
            );
            let catalog = build_catalog(&config)?;
            print_catalog(&catalog);
            Ok(false)
        }

        Command::Vars { global } => {
            let engine = Engine::new(Catalog::new());
            config.apply_variables(engine.globals())?;

            if global {
                for (var, value) in engine.globals().snapshot() {
                    println!("{:<32} {:<8} {}", var.name, var.scope, value);
                }
            } else {
                let session = engine.new_session(config.database.clone());
                for (name, (sql_type, value)) in session.variables().iter() {
                    println!("{:<32} {:<12} {}", name, sql_type.display_name(), value);
                }
            }
            Ok(false)
        }
    }
}

fn check(config: &Config, quiet: bool) -> Result<bool> {
    let output_format = config.output_format()?;
    let engine = build_engine(config)?;

    let query_files = expand_patterns(&config.files)?;
    if query_files.is_empty() {
        miette::bail!(
            "No query files specified. Use positional arguments or configure in sqlbind.toml"
        );
    }

    let disabled_rules: HashSet<&str> = config.disable.iter().map(String::as_str).collect();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for query_file in &query_files {
        let content = fs::read_to_string(query_file).into_diagnostic()?;

        // every file gets a fresh session so SET and USE do not leak
        let session = engine.new_session(Some(current_database(config)));
        let ctx = engine.new_context(session);
        let diagnostics: Vec<_> = engine
            .check(&ctx, &content)
            .into_iter()
            .filter(|d| !disabled_rules.contains(d.code()))
            .collect();
        debug!(file = %query_file.display(), diagnostics = diagnostics.len(), "checked file");

        if !diagnostics.is_empty() {
            let formatter = OutputFormatter::new(output_format, query_file.display().to_string());
            formatter.print_diagnostics(&diagnostics, &content)?;

            for diag in &diagnostics {
                match diag.severity {
                    Severity::Error => total_errors += 1,
                    Severity::Warning => total_warnings += 1,
                    Severity::Info => {}
                }
            }
        }
    }

    if !quiet && output_format == OutputFormat::Human {
        if total_errors > 0 || total_warnings > 0 {
            eprintln!(
                "Found {} error(s), {} warning(s) in {} file(s)",
                total_errors,
                total_warnings,
                query_files.len()
            );
        } else {
            eprintln!("All {} file(s) resolved", query_files.len());
        }
    }

    Ok(total_errors > 0)
}

fn plan(config: &Config, file: &Path) -> Result<bool> {
    let engine = build_engine(config)?;
    let content = fs::read_to_string(file).into_diagnostic()?;
    let ctx = engine.new_context(engine.new_session(Some(current_database(config))));

    match engine.resolve_script(&ctx, &content) {
        Ok(plans) => {
            for (i, plan) in plans.iter().enumerate() {
                println!("Statement {}:", i + 1);
                println!("{}", plan.display_indent());
            }
            Ok(false)
        }
        Err(e) => Err(miette::Report::new(e)),
    }
}

fn current_database(config: &Config) -> String {
    config
        .database
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

fn build_engine(config: &Config) -> Result<Engine> {
    let catalog = build_catalog(config)?;
    let mut analyzer = Analyzer::builder();
    if let Some(max_iterations) = config.max_iterations {
        analyzer = analyzer.with_max_iterations(max_iterations);
    }

    let engine = Engine::new(catalog).with_analyzer(analyzer.build());
    config.apply_variables(engine.globals())?;
    Ok(engine)
}

fn build_catalog(config: &Config) -> Result<Catalog> {
    let mut schema_files = expand_patterns(&config.schema)?;
    if let Some(dir) = &config.schema_dir {
        let pattern = format!("{}/**/*.sql", dir);
        schema_files.extend(glob::glob(&pattern).into_diagnostic()?.flatten());
    }

    if schema_files.is_empty() {
        miette::bail!(
            "No schema files specified. Use --schema, --schema-dir, or configure in sqlbind.toml"
        );
    }

    let mut builder = SchemaBuilder::new();
    for schema_file in &schema_files {
        let content = fs::read_to_string(schema_file).into_diagnostic()?;
        if let Err(diags) = builder.parse(&content) {
            let formatter =
                OutputFormatter::new(OutputFormat::Human, schema_file.display().to_string());
            formatter.print_diagnostics(&diags, &content)?;
            miette::bail!("invalid schema file {}", schema_file.display());
        }
    }
    let (catalog, schema_diags) = builder.build();

    if !schema_diags.is_empty() {
        eprintln!(
            "Warning: Schema parsing produced {} warnings",
            schema_diags.len()
        );
    }
    Ok(catalog)
}

/// Expand glob patterns; plain paths are kept as given
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') {
            paths.extend(glob::glob(pattern).into_diagnostic()?.flatten());
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    Ok(paths)
}

fn print_catalog(catalog: &Catalog) {
    println!("Schema Information:");
    println!("==================");
    for database in catalog.databases.values() {
        println!(
            "\nDatabase: {} ({})",
            database.name,
            database.collation.name()
        );
        for table in database.tables.values() {
            println!("  Table: {}", table.name.name);
            for col in table.columns.values() {
                let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
                println!(
                    "    - {} {} {}",
                    col.name,
                    col.data_type.display_name(),
                    nullable
                );
            }
        }
    }
}
