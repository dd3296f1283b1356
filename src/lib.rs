//! # offsetidx
//!
//! A persistent, memory-mappable index from record ordinals to byte offsets:
//! - Elias-Fano encoding, a few bits per record
//! - Offset → ordinal lookups by binary search over `select`
//! - Atomic save (write temp file, rename) and zero-copy load via mmap
//! - Build-once cache keyed by companion data identity
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Companion data (RecordFile)                 │
//! │              for_each_offset: 0, 37, 112, ...               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      OffsetsBuilder                         │
//! │                (strictly increasing check)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ finish()
//!                       ▼
//!   ┌───────────────────────────────────────────┐
//!   │               OffsetsTable                │
//!   │     offset_at(i)        index_at(off)     │
//!   └──────┬──────────────────────────┬─────────┘
//!          │                          │
//!          ▼                          ▼
//!   ┌─────────────┐   save/load   ┌─────────────┐
//!   │CompactIndex │ ◀───────────▶ │  .efo file  │
//!   │ (heap/mmap) │               │   (mmap)    │
//!   └─────────────┘               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod source;
pub mod table;
pub mod cache;
pub mod records;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{IndexError, Result};
pub use config::{Config, LoadOptions};
pub use codec::{CompactIndex, MonotoneSequence};
pub use source::{CompanionId, CompanionSource};
pub use table::{OffsetsBuilder, OffsetsTable};
pub use cache::{IndexKind, IndexStore};
pub use records::{RecordFile, RecordFileWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of offsetidx
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
