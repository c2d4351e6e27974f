//! Project-specific utilities live here.

use shelf_kernel::api_path;

/// Path of a single resource, used for `Location` headers.
pub fn resource_path(module: &str, id: i64) -> String {
    api_path(module, &format!("/{id}"))
}
