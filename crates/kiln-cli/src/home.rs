//! Runtime home lookup.
//!
//! The home directory holds the runtime image served beneath the classpath.

use std::path::PathBuf;

/// Environment variable naming the runtime home.
pub const HOME_ENV: &str = "KILN_HOME";

/// Image directory inside the runtime home.
pub const IMAGE_DIR: &str = "image";

/// Resolve the runtime home: `KILN_HOME` first, then the configured property.
pub fn find_home(configured: Option<&str>) -> Option<PathBuf> {
    resolve_home(std::env::var(HOME_ENV).ok(), configured)
}

fn resolve_home(env: Option<String>, configured: Option<&str>) -> Option<PathBuf> {
    env.filter(|value| !value.is_empty())
        .or_else(|| configured.map(str::to_string))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
