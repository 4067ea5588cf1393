//! `setimg`: reads a ResourceList, sets images, writes the ResourceList.

use std::{
    fs,
    io::{self, Read as _, Write as _},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, ValueEnum};
use setimg_core::EngineConfig;
use setimg_fn::{Processor, ResourceList};
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "setimg")]
#[command(version)]
#[command(about = "Set container images in a kpt ResourceList")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv, -vvvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json")]
    log_json: bool,

    /// ResourceList to read (default: stdin).
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Where to write the ResourceList (default: stdout).
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Function config replacing the ResourceList's `functionConfig`.
    #[arg(long = "fn-config", value_name = "FILE")]
    fn_config: Option<PathBuf>,

    /// Rewrite documents in parallel.
    #[arg(long = "parallel")]
    parallel: bool,

    /// Output encoding.
    #[arg(long = "format", value_enum, default_value_t = Format::Yaml)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose, cli.log_json) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, json: bool) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().context("invalid RUST_LOG")?
    } else {
        let level = match verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("error,setimg={level},setimg_={level}"))
    };

    // stdout carries the ResourceList
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .context("failed to install log subscriber")?;
    } else {
        registry
            .with(tracing_fmt::layer().with_writer(io::stderr))
            .try_init()
            .context("failed to install log subscriber")?;
    }
    Ok(())
}

/// Returns whether the run produced no error results.
fn run(cli: &Cli) -> Result<bool> {
    let input = read_input(cli.input.as_deref())?;
    let mut list = ResourceList::from_yaml(&input).context("failed to read ResourceList")?;

    if let Some(path) = &cli.fn_config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read function config {}", path.display()))?;
        let config: serde_yaml::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse function config {}", path.display()))?;
        list.function_config = Some(config);
    }

    let engine = EngineConfig::new().with_parallel(cli.parallel);
    let processor = Processor::new(engine)?;
    let list = processor.process(list)?;

    let rendered = match cli.format {
        Format::Yaml => list.to_yaml()?,
        Format::Json => list.to_json()?,
    };
    write_output(cli.output.as_deref(), &rendered)?;

    Ok(!list.has_errors())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
