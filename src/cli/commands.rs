//! CLI command definitions for symptom-intake.
//!
//! Every command reads a model response from a file or stdin, runs it
//! through the response parser and writes the result to stdout.

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::completion::ChatCompletion;
use crate::config::{ParserConfig, CONFIG_ENV_VAR};
use crate::parser::{ParsedResponse, RawResponse, ResponseParser};
use crate::questions::{classify_input_type_with, is_multi_select_with, is_other_option};
use crate::MedicalAnalysis;

/// Parse medical-interview LLM responses into renderable structures.
#[derive(Parser)]
#[command(name = "symptom-intake")]
#[command(about = "Recover and validate question sets and analyses from LLM responses")]
#[command(version)]
#[command(
    long_about = "symptom-intake repairs fenced, truncated or control-character-laden LLM output and validates it into a question set or a medical analysis.\n\nExample usage:\n  symptom-intake parse --input response.txt --pretty\n  symptom-intake parse --completion < completion.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// YAML file overriding default texts and classifier thresholds.
    #[arg(short, long, env = CONFIG_ENV_VAR, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Parse a model response and print the canonical JSON.
    Parse(ParseArgs),

    /// Classify a question's input widget.
    Classify(ClassifyArgs),

    /// Print a per-question summary of a parsed response.
    Inspect(InspectArgs),
}

/// Arguments for `symptom-intake parse`.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// File containing the response (reads stdin when omitted or "-").
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Treat the input as a chat-completion response body.
    #[arg(long)]
    pub completion: bool,

    /// Pretty-print the output JSON.
    #[arg(short, long)]
    pub pretty: bool,

    /// On failure print the raw response text instead of an error.
    #[arg(long)]
    pub fallback_raw: bool,
}

/// Arguments for `symptom-intake classify`.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Question text.
    pub question: String,

    /// Answer option (repeatable) for multi-select and "Other" detection.
    #[arg(short, long = "option")]
    pub options: Vec<String>,
}

/// Arguments for `symptom-intake inspect`.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// File containing the response (reads stdin when omitted or "-").
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Treat the input as a chat-completion response body.
    #[arg(long)]
    pub completion: bool,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let output = match cli.command {
        Commands::Parse(args) => run_parse_command(args, config)?,
        Commands::Classify(args) => run_classify_command(args, &config)?,
        Commands::Inspect(args) => run_inspect_command(args, config)?,
    };
    println!("{}", output);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ParserConfig> {
    match path {
        Some(path) => {
            let config = ParserConfig::from_yaml_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            info!(path = %path.display(), "Loaded parser configuration");
            Ok(config)
        }
        None => Ok(ParserConfig::default()),
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn parse_input(
    parser: &ResponseParser,
    raw: &str,
    completion: bool,
) -> Result<ParsedResponse, crate::ParseError> {
    if completion {
        parser.parse_completion(raw)
    } else {
        parser.parse_str(raw)
    }
}

/// Text to show when parsing fails: the message content if the input is a
/// completion body with text content, otherwise the input itself.
fn fallback_text(raw: &str, completion: bool) -> String {
    if completion {
        if let Ok(body) = ChatCompletion::from_json(raw) {
            if let Some(RawResponse::Text(text)) = body.first_content() {
                return text;
            }
        }
    }
    raw.to_string()
}

fn run_parse_command(args: ParseArgs, config: ParserConfig) -> anyhow::Result<String> {
    let raw = read_input(args.input.as_deref())?;
    let parser = ResponseParser::new(config);

    match parse_input(&parser, &raw, args.completion) {
        Ok(parsed) => {
            let output = if args.pretty {
                serde_json::to_string_pretty(&parsed)?
            } else {
                serde_json::to_string(&parsed)?
            };
            Ok(output)
        }
        Err(e) if args.fallback_raw => {
            warn!(error = %e, "Falling back to raw response text");
            Ok(fallback_text(&raw, args.completion))
        }
        Err(e) => Err(e).context("failed to parse model response"),
    }
}

fn run_classify_command(args: ClassifyArgs, config: &ParserConfig) -> anyhow::Result<String> {
    let input_type = classify_input_type_with(&args.question, &config.thresholds);
    let multi_select = is_multi_select_with(&args.question, &args.options, &config.thresholds);
    let other_options: Vec<&str> = args
        .options
        .iter()
        .map(String::as_str)
        .filter(|option| is_other_option(option))
        .collect();

    let output = json!({
        "input_type": input_type,
        "multi_select": multi_select,
        "other_options": other_options,
    });
    Ok(output.to_string())
}

fn run_inspect_command(args: InspectArgs, config: ParserConfig) -> anyhow::Result<String> {
    let raw = read_input(args.input.as_deref())?;
    let parser = ResponseParser::new(config);
    let parsed = parse_input(&parser, &raw, args.completion)
        .context("failed to parse model response")?;
    Ok(render_summary(&parsed, parser.config()))
}

/// Human-readable summary of a parsed response, one line per question.
pub(crate) fn render_summary(parsed: &ParsedResponse, config: &ParserConfig) -> String {
    let mut out = String::new();

    match parsed {
        ParsedResponse::Analysis(analysis) => {
            let _ = writeln!(out, "medical analysis");
            let _ = writeln!(
                out,
                "  sections: {}",
                MedicalAnalysis::section_keys(Some(analysis.as_value())).join(", ")
            );
            let _ = writeln!(
                out,
                "  probable conditions: {}",
                analysis.probable_conditions().len()
            );
        }
        ParsedResponse::Questions(set) => {
            let _ = writeln!(
                out,
                "question set ({}): {} questions",
                set.interview_phase,
                set.total_questions()
            );
            for q in &set.questions.multiple_choice {
                let mode = if is_multi_select_with(&q.question, &q.options, &config.thresholds) {
                    "multi"
                } else {
                    "single"
                };
                let others = q.options.iter().filter(|o| is_other_option(o)).count();
                let _ = writeln!(
                    out,
                    "  multiple_choice {} [{}] options={} other={}{}",
                    q.id,
                    mode,
                    q.options.len(),
                    others,
                    required_marker(q.required)
                );
            }
            for q in &set.questions.text_and_numbers {
                let _ = writeln!(
                    out,
                    "  text_and_numbers {} [{}]{}",
                    q.id,
                    q.input_type,
                    required_marker(q.required)
                );
            }
            for q in &set.questions.documents_and_scans {
                let _ = writeln!(
                    out,
                    "  documents_and_scans {}{}",
                    q.id,
                    required_marker(q.required)
                );
            }
        }
    }

    out.trim_end().to_string()
}

fn required_marker(required: bool) -> &'static str {
    if required {
        " *"
    } else {
        ""
    }
}
