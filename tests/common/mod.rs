//! Shared test utilities for dgnrust integration tests.
//!
//! Record builders, file assembly and tolerance assertions that all test
//! crates import via `mod common;`.

#![allow(dead_code)]

pub mod builders;
pub mod comparison;

use dgnrust::{DgnFile, DgnReaderConfiguration, Element};
use std::io::Cursor;
use std::path::PathBuf;

// ===========================================================================
// Paths
// ===========================================================================

/// Resolve path into the `test_output/` directory, creating it if needed.
pub fn test_output_path(filename: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_output");
    let _ = std::fs::create_dir_all(&dir);
    dir.join(filename)
}

// ===========================================================================
// Read helpers
// ===========================================================================

/// Open an in-memory design file.
pub fn open_bytes(bytes: Vec<u8>) -> DgnFile<Cursor<Vec<u8>>> {
    DgnFile::from_stream(Cursor::new(bytes))
        .unwrap_or_else(|e| panic!("Cannot open design file: {e:?}"))
}

/// Open an in-memory design file, keeping raw images and skipping bad records.
pub fn open_bytes_failsafe(bytes: Vec<u8>) -> DgnFile<Cursor<Vec<u8>>> {
    let config = DgnReaderConfiguration {
        capture_raw_data: true,
        failsafe: true,
    };
    open_bytes(bytes).with_config(config)
}

/// Read every remaining element of a session.
pub fn read_all<S: std::io::Read + std::io::Seek>(dgn: &mut DgnFile<S>) -> Vec<Element> {
    let mut out = Vec::new();
    while let Some(e) = dgn
        .read_element()
        .unwrap_or_else(|e| panic!("Failed to read element: {e:?}"))
    {
        out.push(e);
    }
    out
}

/// Element ids of a list of elements, in order.
pub fn element_ids(elements: &[Element]) -> Vec<usize> {
    elements
        .iter()
        .map(|e| e.core.element_id.expect("decoded elements carry an id"))
        .collect()
}
