//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use viperflash_flash::{SafeMode, TransportSpec, DEFAULT_PORT_BASE};

/// Default serial bridge line speed
pub const DEFAULT_BAUD: u32 = 1_000_000;

/// Parse a parallel port base address
fn parse_port(s: &str) -> Result<u16, String> {
    viperflash_flash::parse_port_base(s)
}

/// Generate dynamic help text for the transport options
fn transport_help() -> String {
    format!(
        "Transports built in: {}",
        viperflash_flash::transport_names_short()
    )
}

#[derive(Parser)]
#[command(name = "viperflash")]
#[command(author, version, about = "Viper GC flash programmer", long_about = None)]
#[command(after_help = transport_help())]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub transport: TransportArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Transport selection shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct TransportArgs {
    /// Parallel port base address in hex [default: 378]
    #[arg(long, global = true, value_parser = parse_port, conflicts_with_all = ["serial", "dummy"])]
    pub port: Option<u16>,

    /// Use the serial bridge on this device instead of the parallel port
    #[arg(long, global = true, conflicts_with = "dummy")]
    pub serial: Option<String>,

    /// Serial bridge line speed
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Use the in-memory chip emulator
    #[arg(long, global = true)]
    pub dummy: bool,

    /// Disable the acknowledge handshake (faster, but errors go unnoticed)
    #[arg(short, long = "unsafe", global = true)]
    pub unsafe_mode: bool,
}

impl TransportArgs {
    /// The selected transport
    pub fn spec(&self) -> TransportSpec {
        if self.dummy {
            TransportSpec::Dummy
        } else if let Some(device) = &self.serial {
            TransportSpec::Serial {
                device: device.clone(),
                baud: self.baud,
            }
        } else {
            TransportSpec::Parallel {
                base: self.port.unwrap_or(DEFAULT_PORT_BASE),
            }
        }
    }

    /// Handshake policy for the session
    pub fn safe_mode(&self) -> SafeMode {
        if self.unsafe_mode {
            SafeMode::Disabled
        } else {
            SafeMode::Enabled
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the whole chip into a file
    Read {
        /// Output file path
        file: PathBuf,
    },

    /// Erase the chip and write a file to it
    Write {
        /// Input file path (at most 128 KiB)
        file: PathBuf,
    },

    /// Compare chip contents against a file
    Compare {
        /// Input file path to compare against
        file: PathBuf,
    },

    /// List supported transports
    ListTransports,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_transport_is_lpt1() {
        let cli = Cli::try_parse_from(["viperflash", "read", "dump.bin"]).unwrap();
        assert_eq!(
            cli.transport.spec(),
            TransportSpec::Parallel { base: 0x378 }
        );
        assert_eq!(cli.transport.safe_mode(), SafeMode::Enabled);
    }

    #[test]
    fn test_serial_selection() {
        let cli = Cli::try_parse_from([
            "viperflash",
            "--serial",
            "/dev/ttyACM0",
            "-u",
            "write",
            "image.bin",
        ])
        .unwrap();
        assert_eq!(
            cli.transport.spec(),
            TransportSpec::Serial {
                device: "/dev/ttyACM0".to_string(),
                baud: DEFAULT_BAUD,
            }
        );
        assert_eq!(cli.transport.safe_mode(), SafeMode::Disabled);
    }

    #[test]
    fn test_port_and_serial_conflict() {
        let result = Cli::try_parse_from([
            "viperflash",
            "--port",
            "278",
            "--serial",
            "/dev/ttyACM0",
            "read",
            "dump.bin",
        ]);
        assert!(result.is_err());
    }
}
