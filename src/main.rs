use std::io::IsTerminal;
use std::process::ExitCode;

use ambit2x::aggregate::AggregatorConfig;
use ambit2x::cli::{Cli, Commands};
use ambit2x::{convert, inspect, schema, validate};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Convert {
            logs,
            out,
            out_dir,
            format,
            lap_rule,
            dry_run,
            progress,
        } => {
            let options = convert::ConvertOptions {
                log_paths: logs,
                output_path: out,
                out_dir,
                format,
                aggregator: AggregatorConfig {
                    lap_rule,
                    ..AggregatorConfig::default()
                },
                dry_run,
                show_progress: progress,
            };
            let summary = convert::convert_logs(&options)?;
            Ok(exit_code(summary.failed.is_empty()))
        }
        Commands::Inspect { log, json } => {
            inspect::inspect_log(&log, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema {} => {
            schema::print_schema()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { file } => Ok(exit_code(validate::validate_output(&file)?)),
    }
}
