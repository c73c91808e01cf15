//! Programmer traits and abstractions
//!
//! This module defines the traits every transport implements to drive the
//! Viper GC parallel interface, plus the bit layout of the lines themselves.

mod lines;
mod traits;

pub use lines::{OutputLines, StatusLines};
pub use traits::*;
