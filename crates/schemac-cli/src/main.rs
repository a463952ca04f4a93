mod config;
mod driver;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use schemac_build::{BuildError, ClassBuilder};
use schemac_core::{Diagnostics, Severity};
use thiserror::Error;

use config::load_config;
use driver::{
    DriverError, OutputPaths, check_references, describe_raw, init_logging, load_model,
    read_input, render_errors, render_text, write_json, write_text,
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("model error: {0}")]
    Core(#[from] schemac_core::Error),
    #[error("build failed: {0}")]
    Build(#[from] BuildError),
    #[error("{0} unresolved reference(s)")]
    UnresolvedReferences(usize),
    #[error("unsupported option: {0}")]
    Unsupported(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Compile an OpenAPI-style document into a typed object tree.
#[derive(Parser, Debug)]
#[command(name = "schemac", version, about = "Schema-driven document compiler")]
struct Cli {
    /// Write a description of the parsed input to `<stem>.raw`.
    #[arg(long, default_value_t = false)]
    raw: bool,
    /// Text output path (default `<stem>.text`).
    #[arg(long, value_name = "FILE")]
    text_out: Option<PathBuf>,
    /// JSON output path (default `<stem>.json`).
    #[arg(long, value_name = "FILE")]
    json_out: Option<PathBuf>,
    /// Binary output path. Not supported.
    #[arg(long, value_name = "FILE")]
    pb_out: Option<PathBuf>,
    /// Skip the `$ref` check.
    #[arg(long, default_value_t = false)]
    keep_refs: bool,
    /// Write failures and diagnostics to `<stem>.errors`.
    #[arg(long, default_value_t = false)]
    errors: bool,
    /// Class model file (JSON or YAML).
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,
    /// Root class to build.
    #[arg(long, value_name = "CLASS")]
    root: Option<String>,
    /// TOML config file (default `./schemac.toml` when present).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Append JSON logs to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Print the model's class names and exit.
    #[arg(long, default_value_t = false)]
    list_classes: bool,
    /// Input document (JSON or YAML).
    #[arg(value_name = "INPUT", required_unless_present = "list_classes")]
    input: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let result = run_compile(cli);
    if let Err(err) = &result {
        tracing::error!(event = "run_finished", status = "failed", error = %err);
    }
    result
}

fn run_compile(cli: Cli) -> Result<(), CliError> {
    let Cli {
        raw,
        text_out,
        json_out,
        pb_out,
        keep_refs,
        errors,
        model,
        root,
        config,
        log_file: _,
        list_classes,
        input,
    } = cli;

    if let Some(path) = pb_out {
        return Err(CliError::Unsupported(format!(
            "--pb-out {}: binary output is not available",
            path.display()
        )));
    }

    let config = load_config(config.as_deref())?;
    let model_path = model.or(config.model.clone());
    let collection = load_model(model_path.as_deref())?;

    if list_classes {
        for name in collection.sorted_class_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let input = input.ok_or_else(|| CliError::InvalidArgs("INPUT is required".to_string()))?;
    let root = root.unwrap_or(config.root_class.clone());
    let paths = OutputPaths::new(&input, text_out, json_out)?;

    tracing::info!(event = "run_started", input = %input.display(), root = %root);
    let timer = Instant::now();

    let value = read_input(&input)?;
    if raw {
        write_text(&paths.raw, &describe_raw(&value))?;
        tracing::info!(event = "raw_written", path = %paths.raw.display());
    }

    let builder = ClassBuilder::new(&collection, config.build.clone())?;
    let mut diagnostics = Diagnostics::new();

    let document = match builder.build(&root, &value, &mut diagnostics) {
        Ok(document) => document,
        Err(err) => {
            report(&diagnostics);
            if errors {
                write_text(&paths.errors, &render_errors(Some(&err), &diagnostics))?;
            }
            return Err(err.into());
        }
    };
    tracing::info!(event = "build_finished", class = %document.class);

    let unresolved = if keep_refs {
        0
    } else {
        check_references(&document, &value, &mut diagnostics)
    };

    report(&diagnostics);
    if errors && !diagnostics.is_empty() {
        write_text(&paths.errors, &render_errors(None, &diagnostics))?;
    }
    if unresolved > 0 {
        return Err(CliError::UnresolvedReferences(unresolved));
    }

    write_text(&paths.text, &render_text(&document))?;
    tracing::info!(event = "text_written", path = %paths.text.display());

    write_json(&paths.json, &document)?;
    tracing::info!(event = "json_written", path = %paths.json.display());

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(
        event = "run_finished",
        status = "success",
        diagnostics = diagnostics.len(),
        duration_ms = duration_ms
    );

    Ok(())
}

fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        match diagnostic.severity {
            Severity::Error => tracing::error!(event = "diagnostic", kind = %diagnostic.kind, "{diagnostic}"),
            Severity::Warning => tracing::warn!(event = "diagnostic", kind = %diagnostic.kind, "{diagnostic}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn input_is_optional_only_for_class_listing() {
        assert!(Cli::try_parse_from(["schemac"]).is_err());
        assert!(Cli::try_parse_from(["schemac", "--list-classes"]).is_ok());

        let cli = Cli::try_parse_from([
            "schemac",
            "--keep-refs",
            "--json-out=out.json",
            "--root",
            "Info",
            "petstore.yaml",
        ])
        .expect("parse");
        assert!(cli.keep_refs);
        assert_eq!(cli.json_out, Some(PathBuf::from("out.json")));
        assert_eq!(cli.root.as_deref(), Some("Info"));
        assert_eq!(cli.input, Some(PathBuf::from("petstore.yaml")));
    }

    #[test]
    fn binary_output_is_rejected() {
        let cli = Cli::try_parse_from(["schemac", "--pb-out=doc.pb", "petstore.yaml"]).expect("parse");
        assert!(matches!(run_compile(cli), Err(CliError::Unsupported(_))));
    }
}
