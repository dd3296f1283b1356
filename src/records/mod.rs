//! Records Module
//!
//! Length-prefixed record files: the companion data an offsets table indexes.
//! Payloads are opaque; only record boundaries matter here.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                       │
//! │   Magic: "RECF" (4) | Format: u16 (2) | Reserved (2)    │
//! │   DataVersion: u64 (8)                                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Section (variable)                                 │
//! │   [Len: u32 LE][Payload]                                │
//! │   ... repeated for each record ...                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Record offsets are relative to the start of the data section, so the
//! first record is always at offset 0.

mod reader;
mod writer;

pub use reader::RecordFile;
pub use writer::{RecordFileSummary, RecordFileWriter};

/// Magic bytes identifying a record file
pub(crate) const MAGIC: &[u8; 4] = b"RECF";

/// Current record file format version
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Header size: Magic (4) + Format (2) + Reserved (2) + DataVersion (8)
pub const HEADER_SIZE: usize = 16;

/// Length prefix size per record
pub(crate) const LEN_PREFIX_SIZE: u64 = 4;
