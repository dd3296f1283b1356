//! Record File Writer
//!
//! Appends length-prefixed records and reports where each one starts.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

use crate::error::{IndexError, Result};

use super::{FORMAT_VERSION, HEADER_SIZE, LEN_PREFIX_SIZE, MAGIC};

/// Summary of a finished record file
#[derive(Debug, Clone)]
pub struct RecordFileSummary {
    /// Path of the written file
    pub path: PathBuf,
    /// Number of records written
    pub record_count: u64,
    /// Size of the data section in bytes
    pub data_len: u64,
}

/// Writer for new record files
pub struct RecordFileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// Reused framing buffer
    frame: BytesMut,
    /// Bytes written to the data section so far
    data_len: u64,
    record_count: u64,
}

impl RecordFileWriter {
    /// Create (or truncate) a record file tagged with `data_version`
    pub fn create(path: &Path, data_version: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let mut header = BytesMut::with_capacity(HEADER_SIZE);
        header.put_slice(MAGIC);
        header.put_u16_le(FORMAT_VERSION);
        header.put_u16_le(0);
        header.put_u64_le(data_version);
        writer.write_all(&header)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            frame: BytesMut::new(),
            data_len: 0,
            record_count: 0,
        })
    }

    /// Append a record and return its offset within the data section
    pub fn append(&mut self, payload: &[u8]) -> Result<u32> {
        let offset =
            u32::try_from(self.data_len).map_err(|_| IndexError::OffsetOverflow(self.data_len))?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            IndexError::Serialization(format!("record of {} bytes is too large", payload.len()))
        })?;

        self.frame.clear();
        self.frame.reserve(LEN_PREFIX_SIZE as usize + payload.len());
        self.frame.put_u32_le(len);
        self.frame.put_slice(payload);
        self.writer.write_all(&self.frame)?;

        self.data_len += LEN_PREFIX_SIZE + len as u64;
        self.record_count += 1;
        Ok(offset)
    }

    /// Flush, sync and close the file
    pub fn finish(self) -> Result<RecordFileSummary> {
        let file = self.writer.into_inner().map_err(|e| {
            IndexError::Io(std::io::Error::new(
                e.error().kind(),
                format!("Failed to flush record file: {}", e),
            ))
        })?;
        file.sync_all()?;

        Ok(RecordFileSummary {
            path: self.path,
            record_count: self.record_count,
            data_len: self.data_len,
        })
    }
}
