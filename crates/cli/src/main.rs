//! tachar - censor text in PDF files.
//!
//! A command line tool that removes matching text from a PDF's content
//! streams and draws cover bars where the text used to be.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use tachar_core::{CensorOptions, Color, Expression, Mode, censor_file};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Censor text in PDF files.
#[derive(Parser, Debug)]
#[command(name = "tachar")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the PDF file to censor
    input: PathBuf,

    /// Path the censored file is written to, a file or a directory.
    /// Defaults to "<input>_cens.pdf" next to the input
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short = 'q', long, action = ArgAction::SetTrue, conflicts_with = "verbose")]
    quiet: bool,

    /// Censoring expression "regex" or "regex:#RRGGBB"; repeatable,
    /// tried in order, first match wins
    #[arg(short = 'e', long = "expression")]
    expressions: Vec<String>,

    /// Censor only text inside highlight annotations
    #[arg(short = 'm', long = "marked", action = ArgAction::SetTrue, conflicts_with = "unmarked")]
    marked: bool,

    /// Censor only text outside highlight annotations
    #[arg(short = 'u', long = "unmarked", action = ArgAction::SetTrue)]
    unmarked: bool,

    /// Also draw crossed boxes over drawn images and forms
    #[arg(short = 'b', long = "box-objects", action = ArgAction::SetTrue)]
    box_objects: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    init_logging(&args, &config);

    let mode = if args.marked {
        Mode::Marked
    } else if args.unmarked {
        Mode::Unmarked
    } else {
        config.mode()?.unwrap_or_default()
    };

    let expressions = if args.expressions.is_empty() {
        config
            .expressions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|entry| entry.to_expression())
            .collect::<anyhow::Result<Vec<_>>>()?
    } else {
        args.expressions
            .iter()
            .map(|raw| parse_expression(raw))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let output = resolve_output(
        &args.input,
        args.output.as_deref().or(config.output.as_deref()),
    );
    let options = CensorOptions {
        expressions,
        mode,
        box_objects: args.box_objects || config.box_objects.unwrap_or(false),
    };
    debug!(
        input = %args.input.display(),
        output = %output.display(),
        ?mode,
        expressions = options.expressions.len(),
        box_objects = options.box_objects,
        "resolved settings"
    );

    let summary = censor_file(&args.input, &output, &options)
        .with_context(|| format!("failed to censor {}", args.input.display()))?;

    if !args.quiet {
        println!(
            "Censored {} page(s): {} text mark(s), {} object mark(s) -> {}",
            summary.pages,
            summary.text_marks,
            summary.object_marks,
            output.display()
        );
    }
    Ok(())
}

fn init_logging(args: &Args, config: &Config) {
    let verbosity = if args.verbose > 0 {
        args.verbose
    } else {
        config.verbosity.unwrap_or(0)
    };
    let level = if args.quiet {
        "off"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a command-line expression of the form `regex` or
/// `regex:#RRGGBB`. The color suffix is only split off when it actually
/// parses as a color, so regexes containing `:` stay intact.
fn parse_expression(raw: &str) -> anyhow::Result<Expression> {
    if let Some((pattern, suffix)) = raw.rsplit_once(':')
        && let Some(color) = Color::from_hex(suffix)
    {
        return Ok(Expression::new(pattern, Some(color))?);
    }
    Ok(Expression::new(raw, None)?)
}

/// Resolves the output path: explicit file, file inside an explicit
/// directory, or `<stem>_cens.pdf` next to the input.
fn resolve_output(input: &Path, output: Option<&Path>) -> PathBuf {
    let default_name = match input.file_stem() {
        Some(stem) => format!("{}_cens.pdf", stem.to_string_lossy()),
        None => "censored.pdf".to_string(),
    };
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(default_name),
    }
}
