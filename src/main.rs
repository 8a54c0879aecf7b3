use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use fanpost::config::{self, Config, InsertEol};
use fanpost::post::{self, FanContinuity, Summary};
use fanpost::{diagnostics, io};

/// Keep fan speed alive across tool changes in sliced G-code
#[derive(Parser, Debug)]
#[command(name = "fanpost", version)]
struct Cli {
    /// G-code file to process
    input: PathBuf,

    /// Where to write the result; INPUT is rewritten in place when omitted
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// End inserted fan commands with LF instead of the tool line's terminator
    #[arg(long)]
    lf_inserts: bool,

    /// Report fan commands that were left unchanged
    #[arg(long)]
    report: bool,

    /// Process the file but write nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Io(#[from] io::IoError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("cannot print report: {0}")]
    Report(#[source] std::io::Error),
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if cli.lf_inserts {
        config.synthesized_eol = InsertEol::Lf;
    }
    if cli.report {
        config.report = true;
    }

    Ok(config)
}

fn run(cli: &Cli) -> Result<Summary, Error> {
    let config = load_config(cli)?;
    let text = io::read_document(&cli.input)?;

    let mut pass = FanContinuity::new().with_insert_eol(config.synthesized_eol);
    let output = post::process_text(&mut pass, &text);

    if config.report {
        let stderr = std::io::stderr();
        let color = stderr.is_terminal();
        let name = cli.input.display().to_string();
        diagnostics::write_notes(&name, &text, pass.notes(), color, stderr.lock())
            .map_err(Error::Report)?;
    }

    let target = cli.output.as_ref().unwrap_or(&cli.input);
    if cli.dry_run {
        tracing::info!(path = %target.display(), "dry run, nothing written");
    } else {
        io::write_document(target, &output)?;
        tracing::info!(path = %target.display(), "written");
    }

    Ok(pass.summary().clone())
}
