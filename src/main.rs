use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vizlog::stream::logfile;
use vizlog::wrapper::codec::{self, EncodeMode};

/// Inspect and convert vizlog wrapper files.
#[derive(Parser)]
#[command(name = "vizlog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a concise human summary of a log file.
    Inspect {
        /// Log file to read.
        file: PathBuf,
    },
    /// Re-encode a log file compactly or with indentation.
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Emit indented, human-readable output.
        #[arg(long)]
        pretty: bool,
    },
    /// Write the simplified summary of a log file.
    Simplify {
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { file } => {
            let root = logfile::read_log(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            print!("{}", logfile::simplified(&root));
        }
        Command::Convert {
            input,
            output,
            pretty,
        } => {
            let root = logfile::read_log(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let mode = if pretty {
                EncodeMode::Pretty
            } else {
                EncodeMode::Compact
            };
            let bytes = codec::encode(&root, mode)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Command::Simplify { input, output } => {
            let root = logfile::read_log(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            logfile::write_simplified(&output, &root)
                .with_context(|| format!("writing {}", output.display()))?;
        }
    }
    Ok(())
}
