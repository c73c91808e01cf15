//! Transport registry and session setup

use std::fmt;

use viperflash_core::flash::{Session, SessionConfig};
use viperflash_core::programmer::{LineBus, ProgrammerInfo};
use viperflash_core::protocol::SafeMode;

/// Base address of the first parallel port
pub const DEFAULT_PORT_BASE: u16 = 0x378;

/// A transport behind dynamic dispatch
pub type BoxedLineBus = Box<dyn LineBus + Send>;

/// A session over whichever transport was selected
pub type FlashSession = Session<BoxedLineBus>;

/// Parsed transport selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSpec {
    /// Direct parallel port at an I/O base address
    Parallel {
        /// Base I/O address of the port
        base: u16,
    },
    /// Serial bridge on a serial device
    Serial {
        /// Serial device path (e.g. `/dev/ttyACM0`)
        device: String,
        /// Line speed
        baud: u32,
    },
    /// In-memory chip emulator
    Dummy,
}

impl fmt::Display for TransportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parallel { base } => write!(f, "parallel port 0x{:X}", base),
            Self::Serial { device, baud } => write!(f, "serial bridge {} @ {} baud", device, baud),
            Self::Dummy => write!(f, "dummy chip"),
        }
    }
}

/// Parse a parallel port base address (hexadecimal, `0x` optional)
#[cfg(feature = "parport")]
pub fn parse_port_base(s: &str) -> Result<u16, String> {
    viperflash_parport::parse_base(s).map_err(|e| e.to_string())
}

/// Parse a parallel port base address (hexadecimal, `0x` optional)
#[cfg(not(feature = "parport"))]
pub fn parse_port_base(_s: &str) -> Result<u16, String> {
    Err("parallel port support is not built in".to_string())
}

/// Open the selected transport
///
/// `safe_mode` is only consulted for a warning: the bridge firmware enforces
/// the acknowledge handshake no matter what the host asks for.
#[cfg_attr(not(feature = "bridge"), allow(unused_variables))]
pub fn open_transport(
    spec: &TransportSpec,
    safe_mode: SafeMode,
) -> Result<BoxedLineBus, Box<dyn std::error::Error>> {
    match spec {
        #[cfg(feature = "parport")]
        TransportSpec::Parallel { base } => open_parport(*base),
        #[cfg(feature = "bridge")]
        TransportSpec::Serial { device, baud } => open_bridge(device, *baud, safe_mode),
        #[cfg(feature = "dummy")]
        TransportSpec::Dummy => open_dummy(),
        #[allow(unreachable_patterns)]
        _ => Err(format!("Transport not available in this build: {}", spec).into()),
    }
}

/// Open the selected transport and initialize the chip behind it
pub fn open_session(
    spec: &TransportSpec,
    config: SessionConfig,
) -> Result<FlashSession, Box<dyn std::error::Error>> {
    let bus = open_transport(spec, config.safe_mode)?;
    log::debug!("Opened {}", spec);
    let session = Session::open(bus, config)?;
    Ok(session)
}

// Transport-specific open functions

#[cfg(feature = "parport")]
fn open_parport(base: u16) -> Result<BoxedLineBus, Box<dyn std::error::Error>> {
    use viperflash_parport::ParportConfig;

    log::info!("Opening parallel port at 0x{:X}...", base);
    let port = viperflash_parport::open_parport(ParportConfig { base })?;
    Ok(Box::new(port))
}

#[cfg(feature = "bridge")]
fn open_bridge(
    device: &str,
    baud: u32,
    safe_mode: SafeMode,
) -> Result<BoxedLineBus, Box<dyn std::error::Error>> {
    use viperflash_bridge::BridgeConfig;

    log::info!("Opening serial bridge on {}...", device);
    if !safe_mode.is_enabled() {
        log::warn!(
            "Unsafe mode has no effect on the bridge firmware, it always waits for acknowledge"
        );
    }

    let bridge = viperflash_bridge::open_serial(device, BridgeConfig::with_baud(baud))
        .map_err(|e| {
            format!(
                "Failed to open serial bridge on {}: {}\n\
                 Make sure the bridge is connected and you have permissions.",
                device, e
            )
        })?;
    Ok(Box::new(bridge))
}

#[cfg(feature = "dummy")]
fn open_dummy() -> Result<BoxedLineBus, Box<dyn std::error::Error>> {
    log::info!("Using emulated chip");
    Ok(Box::new(viperflash_dummy::EmulatedChip::new_default()))
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<ProgrammerInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "parport")]
    transports.push(ProgrammerInfo {
        name: "parport",
        description: "PC parallel port driven directly (--port <hex base>)",
        requires_root: true,
        streaming: false,
    });

    #[cfg(feature = "bridge")]
    transports.push(ProgrammerInfo {
        name: "serial",
        description: "Microcontroller bridge over a serial link (--serial <device>)",
        requires_root: false,
        streaming: true,
    });

    #[cfg(feature = "dummy")]
    transports.push(ProgrammerInfo {
        name: "dummy",
        description: "In-memory chip emulator for testing (--dummy)",
        requires_root: false,
        streaming: false,
    });

    transports
}

/// Get a short comma-separated list of transport names
pub fn transport_names_short() -> String {
    let transports = available_transports();
    if transports.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = transports.iter().map(|t| t.name).collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TransportSpec::Parallel { base: 0x378 }.to_string(),
            "parallel port 0x378"
        );
        assert_eq!(TransportSpec::Dummy.to_string(), "dummy chip");
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_session() {
        use viperflash_core::flash::NoProgress;
        use viperflash_core::FLASH_SIZE;

        let config = SessionConfig {
            settle_delay_us: 0,
            ..SessionConfig::default()
        };
        let mut session = open_session(&TransportSpec::Dummy, config).unwrap();
        assert!(!session.streaming());

        let image: Vec<u8> = (0..=255).collect();
        session.write_image(&image, &mut NoProgress).unwrap();
        session.compare_image(&image, &mut NoProgress).unwrap();

        let dump = session.read_image(&mut NoProgress).unwrap();
        assert_eq!(dump.len(), FLASH_SIZE);
        assert_eq!(&dump[..256], &image[..]);
    }

    #[cfg(feature = "bridge")]
    #[test]
    fn test_missing_serial_device() {
        let spec = TransportSpec::Serial {
            device: "/nonexistent/ttyVIPER".to_string(),
            baud: 1_000_000,
        };
        assert!(open_transport(&spec, SafeMode::Enabled).is_err());
    }

    #[cfg(feature = "parport")]
    #[test]
    fn test_parse_port_base() {
        assert_eq!(parse_port_base("0x378"), Ok(DEFAULT_PORT_BASE));
        assert_eq!(parse_port_base("3bc"), Ok(0x3BC));
        assert!(parse_port_base("0x0").is_err());
    }

    #[test]
    fn test_names() {
        let names = transport_names_short();
        for info in available_transports() {
            assert!(names.contains(info.name));
        }
    }
}
