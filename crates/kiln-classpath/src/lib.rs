//! Classpath resource resolution
//!
//! Serves type bytes and resources by name from a layered set of sources:
//! - **directories**: probed on demand, in declaration order
//! - **archives**: zip containers indexed once at construction (first archive wins)
//! - **parent**: the wrapped [`ResourceSource`] consulted when neither tier matches
//!
//! The [`ResourceResolver`] is built once before analysis and is immutable
//! afterwards, so it can be shared across analysis workers without locking.

pub mod archive;
pub mod embedded;
pub mod entry;
pub mod error;
pub mod locator;
pub mod name;
pub mod resolver;
pub mod source;

pub use archive::Archive;
pub use embedded::{EmbeddedEntry, EmbeddedResources};
pub use entry::PathEntry;
pub use error::ClasspathError;
pub use locator::Locator;
pub use name::{normalize_name, type_resource_name, TYPE_SUFFIX};
pub use resolver::ResourceResolver;
pub use source::{NoParent, ResourceSource, ResourceStream};
