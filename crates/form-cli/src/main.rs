use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    FormSchema, SchemaIssue, Severity, ValidationResult, build_report, form_schema_document,
    has_errors, lint, render_json, render_text, validate, validation_schema_document,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Survey form visibility tooling",
    long_about = "Resolves conditional field visibility, lints form conditions and validates answers for survey forms"
)]
struct Cli {
    /// Reject forms whose conditions fail linting before doing anything else.
    #[arg(long, global = true)]
    strict: bool,
    /// Log evaluation details to stderr; a set RUST_LOG takes precedence.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show which fields are visible for a set of answers.
    Visible {
        /// Form fetch response body or bare field array (JSON).
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Optional JSON file with the answers collected so far.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report problems in the form's visibility conditions.
    Lint {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
    },
    /// Validate answers against the fields visible for them.
    Validate {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the JSON Schema of the form field list.
    Schema {
        /// Print the schema of the `validate` result instead.
        #[arg(long)]
        validation: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Visible {
            form,
            answers,
            format,
        } => run_visible(&form, answers.as_deref(), format, cli.strict),
        Command::Lint { form } => run_lint(&form),
        Command::Validate { form, answers } => run_validate(&form, &answers, cli.strict),
        Command::Schema { validation } => run_schema(validation),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_form(path: &Path, strict: bool) -> CliResult<FormSchema> {
    let contents = fs::read_to_string(path)?;
    let schema = FormSchema::from_json_str(&contents)?;
    info!(path = %path.display(), fields = schema.len(), "loaded form");
    if strict {
        Ok(schema.strict()?)
    } else {
        Ok(schema)
    }
}

fn load_answers(path: Option<&Path>) -> CliResult<Value> {
    let Some(path) = path else {
        return Ok(Value::Object(Map::new()));
    };
    let contents = fs::read_to_string(path)?;
    let answers: Value = serde_json::from_str(&contents)?;
    if !answers.is_object() {
        return Err(format!("answers in {} must be a JSON object", path.display()).into());
    }
    debug!(answers = answers.as_object().map(Map::len), "loaded answers");
    Ok(answers)
}

fn run_visible(
    form: &Path,
    answers: Option<&Path>,
    format: OutputFormat,
    strict: bool,
) -> CliResult<()> {
    let schema = load_form(form, strict)?;
    let answers = load_answers(answers)?;
    let report = build_report(&schema, &answers);
    match format {
        OutputFormat::Text => println!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&report))?),
    }
    Ok(())
}

fn run_lint(form: &Path) -> CliResult<()> {
    let schema = load_form(form, false)?;
    let issues = lint(&schema);
    if issues.is_empty() {
        println!("No issues found in {} fields.", schema.len());
        return Ok(());
    }

    describe_issues(&issues);
    if has_errors(&issues) {
        Err("form conditions have errors".into())
    } else {
        Ok(())
    }
}

fn describe_issues(issues: &[SchemaIssue]) {
    for issue in issues {
        let level = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!(
            "{}: {} [{}] {}",
            level, issue.field_id, issue.code, issue.message
        );
    }
}

fn run_validate(form: &Path, answers: &Path, strict: bool) -> CliResult<()> {
    let schema = load_form(form, strict)?;
    let answers = load_answers(Some(answers))?;

    let result = validate(&schema, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.path, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!("Unknown answer fields: {}", result.unknown_fields.join(", "));
    }
    if !result.hidden_answers.is_empty() {
        println!(
            "Answers for hidden fields (ignored): {}",
            result.hidden_answers.join(", ")
        );
    }
}

fn run_schema(validation: bool) -> CliResult<()> {
    let document = if validation {
        validation_schema_document()?
    } else {
        form_schema_document()?
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
