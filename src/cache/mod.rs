//! Cache Module
//!
//! Cached indexes keyed by companion identity.
//!
//! ## Responsibilities
//! - Derive a collision-free path per (companion, version, index kind)
//! - Build an index on first use, map it on every later use
//! - Serialize in-process builders racing for the same path
//! - Remove cached indexes for a companion

mod manager;

pub use manager::{IndexStats, IndexStore};

/// File extension of persisted index images
pub const INDEX_EXTENSION: &str = "efo";

/// Discriminates indexes cached alongside one companion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Record ordinal → byte offset table
    Offsets,
    /// Any other index kind, by name
    Named(String),
}

impl IndexKind {
    /// File name within the companion's cache directory
    pub fn file_name(&self) -> String {
        let stem = match self {
            IndexKind::Offsets => "offsets",
            IndexKind::Named(name) => name.as_str(),
        };
        format!("{}.{}", stem, INDEX_EXTENSION)
    }
}
