//! viperflash - Viper GC flash programmer
//!
//! Reads, writes and compares the flash of a Viper GC modchip, either by
//! bit-banging a PC parallel port or through a microcontroller bridge on a
//! serial line.
//!
//! # Architecture
//!
//! All transports implement the `LineBus` trait of `viperflash-core`, so the
//! same session code runs the read, write and compare passes over any of
//! them. The serial bridge additionally offers accelerated streams, which the
//! session picks up on its own.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use viperflash_flash::SessionConfig;

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let spec = cli.transport.spec();
    let config = SessionConfig {
        safe_mode: cli.transport.safe_mode(),
        ..SessionConfig::default()
    };

    match cli.command {
        Commands::Read { file } => commands::run_read(&spec, config, &file),
        Commands::Write { file } => commands::run_write(&spec, config, &file),
        Commands::Compare { file } => commands::run_compare(&spec, config, &file),
        Commands::ListTransports => {
            commands::list_transports();
            Ok(())
        }
    }
}
