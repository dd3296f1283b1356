//! Tests for record files
//!
//! These tests verify:
//! - The writer reports each record's data-section offset
//! - The reader enumerates the same offsets and returns payloads
//! - Identity is derived from the file stem and data version
//! - Malformed files are reported as corrupt, missing files as not found

use std::fs;
use std::path::PathBuf;

use offsetidx::{CompanionId, CompanionSource, IndexError, OffsetsTable, RecordFile, RecordFileWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_records() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("planet.rec");
    (temp_dir, path)
}

fn write_records(path: &PathBuf, payloads: &[&[u8]]) -> Vec<u32> {
    let mut writer = RecordFileWriter::create(path, 3).unwrap();
    let offsets = payloads
        .iter()
        .map(|payload| writer.append(payload).unwrap())
        .collect();
    writer.finish().unwrap();
    offsets
}

fn scanned_offsets(file: &RecordFile) -> offsetidx::Result<Vec<u32>> {
    let mut offsets = Vec::new();
    file.for_each_offset(&mut |offset| {
        offsets.push(offset);
        Ok(())
    })?;
    Ok(offsets)
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_reports_offsets() {
    let (_temp, path) = setup_temp_records();

    let offsets = write_records(&path, &[b"alpha", b"", b"gamma-ray"]);

    // Each record is a 4-byte length prefix plus its payload
    assert_eq!(offsets, vec![0, 9, 13]);
}

#[test]
fn test_writer_summary() {
    let (_temp, path) = setup_temp_records();
    let mut writer = RecordFileWriter::create(&path, 1).unwrap();
    writer.append(b"abc").unwrap();
    writer.append(b"de").unwrap();

    let summary = writer.finish().unwrap();

    assert_eq!(summary.path, path);
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.data_len, 13);
    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        offsetidx::records::HEADER_SIZE as u64 + 13
    );
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_enumerates_written_offsets() {
    let (_temp, path) = setup_temp_records();
    let payloads: Vec<Vec<u8>> = (0..500).map(|i| vec![b'x'; i % 37]).collect();
    let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
    let written = write_records(&path, &refs);

    let file = RecordFile::open(&path).unwrap();

    assert_eq!(scanned_offsets(&file).unwrap(), written);
}

#[test]
fn test_reader_returns_payloads() {
    let (_temp, path) = setup_temp_records();
    let offsets = write_records(&path, &[b"alpha", b"", b"gamma-ray"]);

    let file = RecordFile::open(&path).unwrap();

    assert_eq!(file.read_record(offsets[0]).unwrap(), b"alpha");
    assert_eq!(file.read_record(offsets[1]).unwrap(), b"");
    assert_eq!(file.read_record(offsets[2]).unwrap(), b"gamma-ray");
    assert!(matches!(
        file.read_record(1_000),
        Err(IndexError::OffsetNotFound(1_000))
    ));
}

#[test]
fn test_identity_uses_file_name_and_version() {
    let (_temp, path) = setup_temp_records();
    write_records(&path, &[b"a"]);

    let file = RecordFile::open(&path).unwrap();
    let id = file.identity();

    assert_eq!(file.data_version(), 3);
    assert_eq!(id.name, "planet.rec");
    assert_eq!(id.version, 3);
    assert!(id.origin.is_some());
    assert!(id.to_string().starts_with("planet.rec-"));
    assert!(id.to_string().ends_with("@3"));
}

#[test]
fn test_identity_is_stable_across_opens() {
    let (_temp, path) = setup_temp_records();
    write_records(&path, &[b"a"]);

    let first = RecordFile::open(&path).unwrap().identity();
    let second = RecordFile::open(&path).unwrap().identity();

    assert_eq!(first, second);
}

#[test]
fn test_same_name_in_other_directory_has_distinct_identity() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::create_dir(temp.path().join("b")).unwrap();
    let a = temp.path().join("a").join("planet.rec");
    let b = temp.path().join("b").join("planet.rec");
    write_records(&a, &[b"a"]);
    write_records(&b, &[b"a"]);

    let id_a = RecordFile::open(&a).unwrap().identity();
    let id_b = RecordFile::open(&b).unwrap().identity();

    assert_eq!(id_a.name, id_b.name);
    assert_ne!(id_a, id_b);
    assert_ne!(id_a.dir_name(), id_b.dir_name());
}

#[test]
fn test_same_stem_other_extension_has_distinct_identity() {
    let temp = TempDir::new().unwrap();
    let rec = temp.path().join("planet.rec");
    let dat = temp.path().join("planet.dat");
    write_records(&rec, &[b"a"]);
    write_records(&dat, &[b"a"]);

    let id_rec = RecordFile::open(&rec).unwrap().identity();
    let id_dat = RecordFile::open(&dat).unwrap().identity();

    assert_ne!(id_rec.dir_name(), id_dat.dir_name());
}

#[test]
fn test_plain_identity_has_no_origin() {
    let id = CompanionId::new("planet", 3);

    assert_eq!(id.origin, None);
    assert_eq!(id.dir_name(), "planet");
    assert_eq!(id.to_string(), "planet@3");
}

#[test]
fn test_empty_record_file() {
    let (_temp, path) = setup_temp_records();
    write_records(&path, &[]);

    let file = RecordFile::open(&path).unwrap();

    assert_eq!(file.data_len(), 0);
    assert!(scanned_offsets(&file).unwrap().is_empty());
    assert!(OffsetsTable::build_from(&file).unwrap().is_empty());
}

#[test]
fn test_callback_error_stops_scan() {
    let (_temp, path) = setup_temp_records();
    write_records(&path, &[b"a", b"b", b"c"]);
    let file = RecordFile::open(&path).unwrap();

    let mut seen = 0;
    let result = file.for_each_offset(&mut |_| {
        seen += 1;
        if seen == 2 {
            return Err(IndexError::Codec("stop".to_string()));
        }
        Ok(())
    });

    assert!(matches!(result, Err(IndexError::Codec(_))));
    assert_eq!(seen, 2);
}

// =============================================================================
// Malformed File Tests
// =============================================================================

#[test]
fn test_open_missing_file() {
    let (_temp, path) = setup_temp_records();

    assert!(matches!(
        RecordFile::open(&path),
        Err(IndexError::NotFound(_))
    ));
}

#[test]
fn test_open_bad_magic() {
    let (_temp, path) = setup_temp_records();
    fs::write(&path, [0u8; 32]).unwrap();

    assert!(matches!(
        RecordFile::open(&path),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn test_open_short_file() {
    let (_temp, path) = setup_temp_records();
    fs::write(&path, b"RECF").unwrap();

    assert!(matches!(
        RecordFile::open(&path),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn test_truncated_record_detected_on_scan() {
    let (_temp, path) = setup_temp_records();
    write_records(&path, &[b"complete", b"truncated payload"]);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let file = RecordFile::open(&path).unwrap();

    assert!(matches!(
        scanned_offsets(&file),
        Err(IndexError::Corrupt(_))
    ));
}
