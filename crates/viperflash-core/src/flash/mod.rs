//! Host-side image passes
//!
//! This module provides the programming [`Session`] and the read, write
//! and compare passes it runs.

mod operations;
mod session;

pub use operations::*;
pub use session::{Session, SessionConfig};
