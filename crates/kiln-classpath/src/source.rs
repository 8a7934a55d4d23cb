//! The resolution seam shared by every tier.
//!
//! A [`ResourceSource`] answers lookups by normalized resource name. The
//! [`ResourceResolver`](crate::ResourceResolver) decorates a parent source and
//! implements the trait itself, so resolvers can be stacked.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use crate::locator::Locator;
use crate::name::type_resource_name;

/// An open resource, positioned at its first byte.
#[derive(Debug)]
pub enum ResourceStream {
    /// A file opened from a classpath directory.
    File(File),

    /// Bytes already read into memory (archive entries, embedded resources).
    Memory(Cursor<Vec<u8>>),
}

impl ResourceStream {
    /// Wrap bytes that are already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        ResourceStream::Memory(Cursor::new(bytes))
    }

    /// Drain the remaining content.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            ResourceStream::File(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            ResourceStream::Memory(cursor) => {
                let consumed = cursor.position() as usize;
                let mut bytes = cursor.into_inner();
                bytes.drain(..consumed.min(bytes.len()));
                Ok(bytes)
            }
        }
    }
}

impl Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ResourceStream::File(file) => file.read(buf),
            ResourceStream::Memory(cursor) => cursor.read(buf),
        }
    }
}

/// A tier of resource resolution.
///
/// Lookups never fail hard: a miss or an I/O problem is reported as `None` so
/// callers can fall through to the next tier.
pub trait ResourceSource: Send + Sync {
    /// Open a resource as a byte stream.
    fn open_stream(&self, name: &str) -> Option<ResourceStream>;

    /// Locate a resource without opening it.
    fn resolve_locator(&self, name: &str) -> Option<Locator>;

    /// Read the bytes defining a type.
    fn find_type_bytes(&self, type_name: &str) -> Option<Vec<u8>> {
        self.open_stream(&type_resource_name(type_name))?
            .into_bytes()
            .ok()
    }
}

/// The empty source: every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParent;

impl ResourceSource for NoParent {
    fn open_stream(&self, _name: &str) -> Option<ResourceStream> {
        None
    }

    fn resolve_locator(&self, _name: &str) -> Option<Locator> {
        None
    }

    fn find_type_bytes(&self, _type_name: &str) -> Option<Vec<u8>> {
        None
    }
}

impl<S: ResourceSource + ?Sized> ResourceSource for Arc<S> {
    fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        (**self).open_stream(name)
    }

    fn resolve_locator(&self, name: &str) -> Option<Locator> {
        (**self).resolve_locator(name)
    }

    fn find_type_bytes(&self, type_name: &str) -> Option<Vec<u8>> {
        (**self).find_type_bytes(type_name)
    }
}

impl<S: ResourceSource + ?Sized> ResourceSource for Box<S> {
    fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        (**self).open_stream(name)
    }

    fn resolve_locator(&self, name: &str) -> Option<Locator> {
        (**self).resolve_locator(name)
    }

    fn find_type_bytes(&self, type_name: &str) -> Option<Vec<u8>> {
        (**self).find_type_bytes(type_name)
    }
}
