//! Protocol implementations
//!
//! This module contains the Viper GC signalling layers, from the pentad
//! encoder up to the command sequences and the bridge stream framing.

pub mod chip;
pub mod pentad;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use pentad::{emit, Pentad, SafeMode};
