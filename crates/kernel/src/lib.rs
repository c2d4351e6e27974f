//! Module lifecycle, registry, and layered settings shared by every SHELF crate.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{api_path, InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
