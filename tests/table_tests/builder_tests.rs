//! Tests for OffsetsBuilder
//!
//! These tests verify:
//! - Strict monotonicity is enforced at push time
//! - A rejected push leaves the sequence unchanged
//! - finish() produces a table holding exactly the pushed offsets

use offsetidx::{IndexError, OffsetsBuilder, OffsetsTable};

#[test]
fn test_new_builder_is_empty() {
    let builder = OffsetsBuilder::new();

    assert!(builder.is_empty());
    assert_eq!(builder.len(), 0);
    assert_eq!(builder.last(), None);
}

#[test]
fn test_duplicate_offset_rejected() {
    let mut builder = OffsetsBuilder::new();
    builder.push_offset(10).unwrap();
    builder.push_offset(25).unwrap();

    let result = builder.push_offset(25);

    assert!(matches!(
        result,
        Err(IndexError::OrderViolation {
            previous: 25,
            offset: 25
        })
    ));
    assert_eq!(builder.offsets(), &[10, 25]);
}

#[test]
fn test_decreasing_offset_rejected() {
    let mut builder = OffsetsBuilder::with_capacity(4);
    builder.push_offset(100).unwrap();

    assert!(matches!(
        builder.push_offset(3),
        Err(IndexError::OrderViolation { .. })
    ));
    assert_eq!(builder.len(), 1);
    assert_eq!(builder.last(), Some(100));
}

#[test]
fn test_push_continues_after_rejection() {
    let mut builder = OffsetsBuilder::new();
    builder.push_offset(1).unwrap();
    assert!(builder.push_offset(0).is_err());
    builder.push_offset(2).unwrap();

    assert_eq!(builder.offsets(), &[1, 2]);
}

#[test]
fn test_zero_is_a_valid_first_offset() {
    let mut builder = OffsetsBuilder::new();
    builder.push_offset(0).unwrap();
    builder.push_offset(1).unwrap();

    let table = builder.finish().unwrap();
    assert_eq!(table.offset_at(0).unwrap(), 0);
    assert_eq!(table.offset_at(1).unwrap(), 1);
}

#[test]
fn test_finish_builds_in_memory_table() {
    let mut builder = OffsetsBuilder::new();
    for offset in [4, 8, 15, 16, 23, 42] {
        builder.push_offset(offset).unwrap();
    }

    let table = OffsetsTable::build(builder).unwrap();

    assert!(!table.is_mapped());
    assert_eq!(table.len(), 6);
    assert_eq!(table.iter().collect::<Vec<_>>(), vec![4, 8, 15, 16, 23, 42]);
}

#[test]
fn test_finish_empty_builder() {
    let table = OffsetsBuilder::new().finish().unwrap();

    assert!(table.is_empty());
    assert_eq!(table.min_offset(), None);
    assert_eq!(table.max_offset(), None);
}

#[test]
fn test_max_u32_offset() {
    let mut builder = OffsetsBuilder::new();
    builder.push_offset(0).unwrap();
    builder.push_offset(u32::MAX).unwrap();

    let table = builder.finish().unwrap();
    assert_eq!(table.offset_at(1).unwrap(), u32::MAX);
    assert_eq!(table.index_at(u32::MAX).unwrap(), 1);
}
