//! Table Module
//!
//! Offsets table: record ordinal → byte offset, and back.
//!
//! ## Lifecycle
//! ```text
//!   OffsetsBuilder ──finish()──▶ OffsetsTable (owned image)
//!         ▲                            │
//!   push_offset() per record        save(path): write path.tmp, rename
//!         │                            ▼
//!   CompanionSource scan        OffsetsTable::load(path) (mapped image)
//! ```
//!
//! Owned and mapped tables hold the same bytes and answer every query the
//! same way.

mod builder;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::codec::{Backing, CompactIndex, MonotoneSequence, HEADER_SIZE};
use crate::config::{Config, LoadOptions};
use crate::error::{IndexError, Result};
use crate::source::CompanionSource;

pub use builder::OffsetsBuilder;

/// Immutable bidirectional map between record ordinals and byte offsets
#[derive(Debug, PartialEq, Eq)]
pub struct OffsetsTable {
    index: CompactIndex,
}

impl OffsetsTable {
    pub(crate) fn from_index(index: CompactIndex) -> Self {
        Self { index }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Encode the offsets collected by `builder`
    pub fn build(builder: OffsetsBuilder) -> Result<Self> {
        builder.finish()
    }

    /// Scan `source` once and encode every offset it reports
    pub fn build_from<S: CompanionSource + ?Sized>(source: &S) -> Result<Self> {
        let companion = source.identity();
        tracing::info!(%companion, "Building offsets table");

        let mut builder = OffsetsBuilder::new();
        source.for_each_offset(&mut |offset| builder.push_offset(offset))?;
        let table = builder.finish()?;

        tracing::info!(
            %companion,
            entries = table.len(),
            bytes = table.size_in_bytes(),
            "Built offsets table"
        );
        Ok(table)
    }

    /// Map a persisted table read-only.
    ///
    /// Returns [`IndexError::NotFound`] when `path` does not exist and
    /// [`IndexError::Corrupt`] when the file fails validation.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self> {
        if !path.exists() {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(IndexError::Corrupt(format!(
                "{} is {} bytes, shorter than the header",
                path.display(),
                file_len
            )));
        }

        // SAFETY: the mapping is read-only and tables are only ever replaced
        // by rename, never rewritten in place.
        let mmap = unsafe { Mmap::map(&file)? };
        let index = CompactIndex::from_backing(Backing::Mapped(mmap), options)?;

        if index.max_value() > u32::MAX as u64 {
            return Err(IndexError::Corrupt(format!(
                "maximum offset {} exceeds 32 bits",
                index.max_value()
            )));
        }

        tracing::debug!(path = %path.display(), entries = index.len(), "Mapped offsets table");
        Ok(Self { index })
    }

    /// Persist atomically: write `<path>.<tmp_extension>`, then rename over `path`.
    ///
    /// A reader never observes a partial file; on failure the temporary file
    /// is removed and `path` is left as it was.
    pub fn save(&self, path: &Path, config: &Config) -> Result<()> {
        let tmp_path = tmp_path(path, &config.tmp_extension);
        tracing::info!(path = %path.display(), "Saving offsets table");

        let result = self
            .write_image(&tmp_path, config.sync_on_save)
            .and_then(|()| fs::rename(&tmp_path, path).map_err(IndexError::from));

        if result.is_err() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                tracing::warn!(path = %tmp_path.display(), error = %e, "Failed to remove temporary file");
            }
        }
        result
    }

    fn write_image(&self, tmp_path: &Path, sync: bool) -> Result<()> {
        let mut file = File::create(tmp_path)?;
        file.write_all(self.index.as_bytes())?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Load `cache_path` if it exists, otherwise build from `source` and save.
    ///
    /// The scan runs at most once per cache path; later calls map the file.
    pub fn create_if_absent_or_load<S: CompanionSource + ?Sized>(
        source: &S,
        cache_path: &Path,
        config: &Config,
    ) -> Result<Self> {
        if cache_path.exists() {
            tracing::debug!(path = %cache_path.display(), "Offsets table cache hit");
            return Self::load(cache_path, &config.load_options());
        }

        let table = Self::build_from(source)?;
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        table.save(cache_path, config)?;
        Ok(table)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Byte offset of the record at `index`
    pub fn offset_at(&self, index: usize) -> Result<u32> {
        let value = self.index.select(index)?;
        u32::try_from(value).map_err(|_| IndexError::OffsetOverflow(value))
    }

    /// Ordinal of the record starting exactly at `offset`.
    ///
    /// Offsets between two record starts are an error, never rounded.
    pub fn index_at(&self, offset: u32) -> Result<usize> {
        let ordinal = self.index.predecessor_index(offset as u64)?;
        if self.index.select(ordinal)? != offset as u64 {
            return Err(IndexError::OffsetNotFound(offset));
        }
        Ok(ordinal)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Smallest stored offset
    pub fn min_offset(&self) -> Option<u32> {
        self.offset_at(0).ok()
    }

    /// Largest stored offset
    pub fn max_offset(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            self.offset_at(self.len() - 1).ok()
        }
    }

    /// All offsets in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.index.iter().map(|v| v as u32)
    }

    /// Whether the table is backed by a memory map
    pub fn is_mapped(&self) -> bool {
        self.index.is_mapped()
    }

    /// Encoded size in bytes (equal to the persisted file size)
    pub fn size_in_bytes(&self) -> usize {
        self.index.size_in_bytes()
    }

    /// Underlying codec view
    pub fn compact_index(&self) -> &CompactIndex {
        &self.index
    }
}

/// `<path>.<ext>` without replacing an existing extension
fn tmp_path(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
