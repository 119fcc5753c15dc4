//! Styled QR code generator CLI.

use std::io::{self, IsTerminal};

use clap::Parser;
use qrtint::logging::{init_logging, LogConfig, LogFormat};

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg};
use crate::commands::{exit_code, print_report, run_generate, run_palette};

fn main() {
    let cli = Cli::parse();
    let log_config = log_config_from_cli(&cli).with_ansi(io::stderr().is_terminal());
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let code = match cli.command {
        Command::Generate(args) => match run_generate(&args) {
            Ok(report) => match print_report(&report, args.json) {
                Ok(()) => exit_code(&report),
                Err(error) => {
                    eprintln!("error: {error:#}");
                    1
                }
            },
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Palette(args) => match run_palette(&args) {
            Ok(palette) => {
                for hex in palette.to_hex() {
                    println!("{hex}");
                }
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose, cli.quiet).with_format(format)
}
