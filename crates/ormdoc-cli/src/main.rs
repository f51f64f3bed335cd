//! ormdoc command-line tool
//!
//! Loads a JSON model descriptor, builds and checks the model and prints the
//! resulting table schema or the flattened classes.

mod error;
mod formatter;

use clap::{Parser, ValueEnum};
use error::CliError;
use formatter::OutputFormat;
use ormdoc_core::{CheckLevel, GeneratorConfig, ModelDescriptor, DEFAULT_DATABASE_NAME};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// What to print after a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The table schema
    Schema,
    /// The flattened classes
    Model,
    /// Nothing, only check
    None,
}

/// ormdoc metadata checker
#[derive(Parser, Debug)]
#[command(name = "ormdoc")]
#[command(version, about = "Build, check and export object/relational mapping metadata")]
pub struct Args {
    /// Model descriptor (JSON)
    pub file: PathBuf,

    /// Check level
    #[arg(short = 'l', long, default_value = "basic")]
    pub check_level: CheckLevel,

    /// What to print
    #[arg(long, default_value = "schema", value_enum)]
    pub emit: Emit,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Database name of the table schema
    #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
    pub database: String,

    /// Do not log warnings as they occur
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the collected warnings after the output
    #[arg(short, long)]
    pub warnings: bool,
}

impl Args {
    /// Generator configuration for these arguments.
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new(self.check_level)
            .with_database_name(self.database.clone())
            .with_echo_warnings(!self.quiet);
        if self.emit == Emit::Schema {
            config
        } else {
            config.without_schema()
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ormdoc_core=info,ormdoc_cli=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<String, CliError> {
    let (model, types) = ModelDescriptor::from_file(&args.file)?.into_model()?;
    let config = args.generator_config();
    tracing::debug!(file = %args.file.display(), level = %config.check_level, "checking model");

    let generated = ormdoc_core::generate(model, &config, &types)?;
    let formatter = formatter::create_formatter(args.format);

    let mut output = match (args.emit, &generated.schema) {
        (Emit::Schema, Some(schema)) => formatter.format_schema(schema)?,
        (Emit::Model, _) => formatter.format_model(&generated.model)?,
        _ => String::new(),
    };
    if args.warnings {
        if !output.is_empty() {
            output.push_str("\n\n");
        }
        output.push_str(&formatter.format_diagnostics(&generated.diagnostics)?);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "classes": [{
            "name": "com.acme.Person",
            "properties": { "ojb-persistent": "true" },
            "fields": [{ "name": "id", "properties": { "primarykey": "true", "jdbc-type": "INTEGER" } }]
        }]
    }"#;

    fn descriptor(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn args(extra: &[&str], file: &tempfile::NamedTempFile) -> Args {
        let path = file.path().to_string_lossy().to_string();
        let mut argv = vec!["ormdoc".to_string(), path];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_generator_config() {
        let file = descriptor(MODEL);
        let config = args(&["--check-level", "strict", "--emit", "model", "-q"], &file).generator_config();
        assert_eq!(config.check_level, CheckLevel::Strict);
        assert!(!config.generate_schema);
        assert!(!config.echo_warnings);
        assert_eq!(config.database_name, DEFAULT_DATABASE_NAME);
    }

    #[test]
    fn test_invalid_check_level() {
        let result = Args::try_parse_from(["ormdoc", "model.json", "--check-level", "paranoid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_schema() {
        let file = descriptor(MODEL);
        let output = run(&args(&["--database", "acme", "-q"], &file)).unwrap();
        assert!(output.starts_with("Database acme"));
        assert!(output.contains("Person"));
    }

    #[test]
    fn test_run_json_model() {
        let file = descriptor(MODEL);
        let output = run(&args(&["--emit", "model", "--format", "json", "-q"], &file)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["classes"][0]["name"], "com.acme.Person");
    }

    #[test]
    fn test_run_reports_violation() {
        let file = descriptor(
            r#"{ "classes": [{ "name": "A", "fields": [{ "name": "id", "properties": { "jdbc-type": "TEXT" } }] }] }"#,
        );
        let err = run(&args(&["-q"], &file)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The field id in class A specifies the invalid jdbc type TEXT"
        );
    }
}
