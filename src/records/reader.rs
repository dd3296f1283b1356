//! Record File Reader
//!
//! Maps a record file and enumerates record boundaries for the offsets
//! table builder.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use bytes::Buf;
use memmap2::Mmap;

use crate::error::{IndexError, Result};
use crate::source::{CompanionId, CompanionSource};

use super::{FORMAT_VERSION, HEADER_SIZE, LEN_PREFIX_SIZE, MAGIC};

/// Read-only view of a record file
pub struct RecordFile {
    path: PathBuf,
    /// Canonical form of `path`, used for identity
    canonical: PathBuf,
    data_version: u64,
    mmap: Mmap,
}

impl RecordFile {
    /// Open and validate the header of a record file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }

        let canonical = fs::canonicalize(path)?;
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(IndexError::Corrupt(format!(
                "record file {} is {} bytes, shorter than the header",
                path.display(),
                file_len
            )));
        }

        // SAFETY: record files are written once and never modified in place.
        let mmap = unsafe { Mmap::map(&file)? };

        let mut header = &mmap[..HEADER_SIZE];
        let mut magic = [0u8; 4];
        header.copy_to_slice(&mut magic);
        if &magic != MAGIC {
            return Err(IndexError::Corrupt(format!(
                "invalid record file magic: expected RECF, got {:?}",
                magic
            )));
        }

        let version = header.get_u16_le();
        if version != FORMAT_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported record file version: {}",
                version
            )));
        }
        header.advance(2); // Reserved
        let data_version = header.get_u64_le();

        Ok(Self {
            path: path.to_path_buf(),
            canonical,
            data_version,
            mmap,
        })
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version tag written by the producer
    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    /// Size of the data section in bytes
    pub fn data_len(&self) -> u64 {
        (self.mmap.len() - HEADER_SIZE) as u64
    }

    fn data(&self) -> &[u8] {
        &self.mmap[HEADER_SIZE..]
    }

    /// Payload of the record starting at `offset`
    pub fn read_record(&self, offset: u32) -> Result<&[u8]> {
        let data = self.data();
        let start = offset as usize;
        let payload_start = start + LEN_PREFIX_SIZE as usize;
        if payload_start > data.len() {
            return Err(IndexError::OffsetNotFound(offset));
        }

        let len = (&data[start..payload_start]).get_u32_le() as usize;
        data.get(payload_start..payload_start + len).ok_or_else(|| {
            IndexError::Corrupt(format!("record at offset {} runs past end of file", offset))
        })
    }
}

impl CompanionSource for RecordFile {
    /// File name plus data version, tagged with the canonical path so
    /// same-named files in different directories never share a cache entry
    fn identity(&self) -> CompanionId {
        let name = self
            .canonical
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        CompanionId::new(name, self.data_version).with_origin(&self.canonical)
    }

    fn for_each_offset(&self, f: &mut dyn FnMut(u32) -> Result<()>) -> Result<()> {
        let mut data = self.data();
        let mut offset: u64 = 0;

        while data.has_remaining() {
            if data.remaining() < LEN_PREFIX_SIZE as usize {
                return Err(IndexError::Corrupt(format!(
                    "truncated record length at offset {}",
                    offset
                )));
            }
            let len = data.get_u32_le() as usize;
            if data.remaining() < len {
                return Err(IndexError::Corrupt(format!(
                    "record at offset {} needs {} bytes, {} left",
                    offset,
                    len,
                    data.remaining()
                )));
            }

            let start = u32::try_from(offset).map_err(|_| IndexError::OffsetOverflow(offset))?;
            f(start)?;

            data.advance(len);
            offset += LEN_PREFIX_SIZE + len as u64;
        }
        Ok(())
    }
}
