use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use dagz::cli::{Cli, Commands};
use dagz::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Commands::Compress(args) if args.verbose => "dagz=info",
        _ => "dagz=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Compress(args) => {
            info!("starting compression");
            dagz::compress::compress(&args)
                .with_context(|| format!("failed to compress {}", args.input.display()))?;
            info!("compression complete");
        }
    }
    Ok(())
}

/// Exhausting the pointer address space means the input is beyond what the
/// format supports; everything else is an input or I/O problem.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(Error::Capacity) => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}
