//! viperflash-dummy - In-memory Viper GC emulator for testing
//!
//! This crate provides an emulated Viper GC chip that speaks the pentad
//! protocol on emulated parallel lines, and an emulated serial bridge that
//! runs the real firmware engine over it. Both are useful for testing and
//! development without real hardware.

pub mod bridge;
pub mod chip;

pub use bridge::{ChannelLink, ChannelTransport, EmulatedBridge};
pub use chip::{ChipConfig, ChipStats, EmulatedChip};
