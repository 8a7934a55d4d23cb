//! Resource name handling.
//!
//! Resource names are `/`-separated paths relative to a classpath root. Type
//! bytes live in the same namespace: `x.y.Z` is served from `x/y/Z.class`.

use std::path::{Component, Path};

/// Suffix appended to a type's path to form its resource name.
pub const TYPE_SUFFIX: &str = ".class";

/// Normalize a resource name for lookup.
///
/// - Replace backslashes with forward slashes
/// - Remove leading `./` and `/`
pub fn normalize_name(name: &str) -> String {
    let mut n = name.replace('\\', "/");
    loop {
        if let Some(rest) = n.strip_prefix("./") {
            n = rest.to_string();
        } else if let Some(rest) = n.strip_prefix('/') {
            n = rest.to_string();
        } else {
            break;
        }
    }
    n
}

/// Derive the resource name holding a type's bytes.
pub fn type_resource_name(type_name: &str) -> String {
    let mut name = type_name.replace('.', "/");
    name.push_str(TYPE_SUFFIX);
    name
}

/// Whether a normalized name can be joined onto a directory without escaping it.
pub(crate) fn is_contained(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
