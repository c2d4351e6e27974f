//! SHELF application library
//!
//! Author and book modules, fixtures, and the bootstrap shared by the server
//! binary and the CLI.

pub mod bootstrap;
pub mod fixtures;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
