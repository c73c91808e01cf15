//! Serial bridge link settings

/// Default link speed
pub const DEFAULT_BAUD: u32 = 1_000_000;

/// Default wait for a single reply byte
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// Default wait for a chunk acknowledgment
pub const DEFAULT_ACK_TIMEOUT_MS: u32 = 5_000;

/// Pause before the second bring-up attempt
///
/// Most bridge boards reboot when the port is opened and miss the first
/// ping.
pub const DEFAULT_RETRY_DELAY_MS: u32 = 1_000;

/// Link tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Serial speed in baud
    pub baud: u32,
    /// Wait for status replies and stream data
    pub timeout_ms: u32,
    /// Wait for write chunk acknowledgments
    pub ack_timeout_ms: u32,
    /// Pause before retrying the bring-up ping
    pub retry_delay_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl BridgeConfig {
    /// Default settings at another baud rate
    pub fn with_baud(baud: u32) -> Self {
        Self {
            baud,
            ..Self::default()
        }
    }
}
