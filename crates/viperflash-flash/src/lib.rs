//! Transport selection for the Viper GC flash programmer
//!
//! The CLI only talks to this crate and to the session types of
//! `viperflash-core`. It never names a concrete transport: the selection is
//! parsed into a [`TransportSpec`], and [`open_session`] turns that into a
//! ready [`FlashSession`] over a boxed line bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI (bin/viperflash)                    │
//! │  - Builds a TransportSpec from --port / --serial / --dummy  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  viperflash-flash (this crate)               │
//! │  - Opens the selected transport as Box<dyn LineBus>         │
//! │  - Initializes the chip into a Session                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!      viperflash-parport  viperflash-bridge  viperflash-dummy
//! ```
//!
//! # Example
//!
//! ```ignore
//! use viperflash_flash::{open_session, TransportSpec};
//! use viperflash_core::flash::{NoProgress, SessionConfig};
//!
//! let spec = TransportSpec::Parallel { base: 0x378 };
//! let mut session = open_session(&spec, SessionConfig::default())?;
//! let image = session.read_image(&mut NoProgress)?;
//! ```

mod registry;

pub use registry::{
    available_transports, open_session, open_transport, parse_port_base, transport_names_short,
    BoxedLineBus, FlashSession, TransportSpec, DEFAULT_PORT_BASE,
};

// Re-export core types that the CLI needs
pub use viperflash_core::flash::{Progress, SessionConfig, WriteStats};
pub use viperflash_core::programmer::ProgrammerInfo;
pub use viperflash_core::protocol::SafeMode;
