//! Companion data sources
//!
//! A companion source is the data blob an offsets table indexes. The table
//! never reads records itself; it asks the source to enumerate record start
//! offsets and identifies cached tables by the source's identity.

use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Identity of a companion data file, used to key cached indexes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanionId {
    /// Stable name, typically the file name
    pub name: String,
    /// Data version; a new version gets a fresh cache entry
    pub version: u64,
    /// Tells apart companions that share a name, e.g. files in different
    /// directories
    pub origin: Option<u32>,
}

impl CompanionId {
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        Self {
            name: name.into(),
            version,
            origin: None,
        }
    }

    /// Tag the identity with the location it was read from.
    ///
    /// The tag is a CRC32 of the path, stable across runs; pass a
    /// canonical path so every spelling of one file agrees.
    pub fn with_origin(mut self, path: &Path) -> Self {
        self.origin = Some(crc32fast::hash(path.to_string_lossy().as_bytes()));
        self
    }

    /// Directory name for this companion's cached indexes
    pub fn dir_name(&self) -> String {
        match self.origin {
            Some(origin) => format!("{}-{:08x}", self.name, origin),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for CompanionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.dir_name(), self.version)
    }
}

/// Producer of record start offsets.
///
/// `for_each_offset` must report offsets in strictly increasing order and
/// stop at the first error returned by the callback.
pub trait CompanionSource {
    /// Identity used to derive cache paths
    fn identity(&self) -> CompanionId;

    /// Enumerate every record's starting offset in file order
    fn for_each_offset(&self, f: &mut dyn FnMut(u32) -> Result<()>) -> Result<()>;
}
