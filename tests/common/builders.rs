//! Raw record builders for synthetic design files.
//!
//! Everything here writes bytes directly, so tests of the reader do not
//! depend on the writer.

#![allow(dead_code)]

use dgnrust::io::dgn::cursor::encode_int32;
use dgnrust::io::dgn::float::ieee_to_vax;
use std::io::Write;

pub const TCB_SIZE: usize = 1536;

/// Working units of a synthetic TCB.
#[derive(Debug, Clone, Copy)]
pub struct SeedUnits {
    pub subunits_per_master: i32,
    pub uor_per_subunit: i32,
    /// Global origin in UOR
    pub origin: [f64; 3],
}

impl Default for SeedUnits {
    fn default() -> Self {
        SeedUnits {
            subunits_per_master: 1,
            uor_per_subunit: 1,
            origin: [0.0; 3],
        }
    }
}

fn put_int32(raw: &mut [u8], offset: usize, v: i32) {
    raw[offset..offset + 4].copy_from_slice(&encode_int32(v));
}

/// Store a signed UOR value in the 2^31 biased form of the range block.
fn put_biased(raw: &mut [u8], offset: usize, v: i32) {
    put_int32(raw, offset, (v as u32 ^ 0x8000_0000) as i32);
}

/// Record of `size` bytes with the header filled in.
pub fn record(element_type: u8, level: u8, size: usize) -> Vec<u8> {
    assert!(size >= 4 && size % 2 == 0);
    let mut raw = vec![0u8; size];
    raw[0] = level;
    raw[1] = element_type;
    raw[2..4].copy_from_slice(&((size / 2 - 2) as u16).to_le_bytes());
    raw
}

/// Type 9 TCB record with units, origin and dimension.
pub fn tcb(dim3: bool, units: SeedUnits) -> Vec<u8> {
    let mut raw = vec![0u8; TCB_SIZE];
    raw[0] = if dim3 { 0xc8 } else { 0x08 };
    raw[1] = 0x09;
    raw[2] = 0xfe;
    raw[3] = 0x02;
    if dim3 {
        raw[1214] |= 0x40;
    }
    put_int32(&mut raw, 1112, units.subunits_per_master);
    put_int32(&mut raw, 1116, units.uor_per_subunit);
    raw[1120..1122].copy_from_slice(b"MU");
    raw[1122..1124].copy_from_slice(b"SU");
    for (axis, v) in units.origin.iter().enumerate() {
        let at = 1240 + axis * 8;
        raw[at..at + 8].copy_from_slice(&ieee_to_vax(*v));
    }
    raw
}

/// 2D TCB with identity units.
pub fn tcb_2d() -> Vec<u8> {
    tcb(false, SeedUnits::default())
}

/// Range block from UOR corners.
pub fn set_range(raw: &mut [u8], min: [i32; 3], max: [i32; 3]) {
    for axis in 0..3 {
        put_biased(raw, 4 + axis * 4, min[axis]);
        put_biased(raw, 16 + axis * 4, max[axis]);
    }
}

/// 2D line with a matching range block.
pub fn line_2d(level: u8, a: [i32; 2], b: [i32; 2]) -> Vec<u8> {
    let mut raw = record(3, level, 52);
    raw[30..32].copy_from_slice(&10u16.to_le_bytes());
    set_range(
        &mut raw,
        [a[0].min(b[0]), a[1].min(b[1]), 0],
        [a[0].max(b[0]), a[1].max(b[1]), 0],
    );
    put_int32(&mut raw, 36, a[0]);
    put_int32(&mut raw, 40, a[1]);
    put_int32(&mut raw, 44, b[0]);
    put_int32(&mut raw, 48, b[1]);
    raw
}

/// 2D line string with a matching range block.
pub fn line_string_2d(level: u8, points: &[[i32; 2]]) -> Vec<u8> {
    let mut raw = record(4, level, 38 + points.len() * 8);
    raw[36..38].copy_from_slice(&(points.len() as u16).to_le_bytes());
    let mut min = [i32::MAX, i32::MAX, 0];
    let mut max = [i32::MIN, i32::MIN, 0];
    for (i, p) in points.iter().enumerate() {
        put_int32(&mut raw, 38 + i * 8, p[0]);
        put_int32(&mut raw, 42 + i * 8, p[1]);
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    set_range(&mut raw, min, max);
    raw
}

/// Complex chain header (type 12) over `members` following records.
pub fn complex_chain_header(
    level: u8,
    members: &[Vec<u8>],
    min: [i32; 3],
    max: [i32; 3],
) -> Vec<u8> {
    let mut raw = record(12, level, 44);
    set_range(&mut raw, min, max);
    let words: usize = members.iter().map(|m| m.len() / 2).sum();
    raw[36..38].copy_from_slice(&(words as u16).to_le_bytes());
    raw[38..40].copy_from_slice(&(members.len() as u16).to_le_bytes());
    raw
}

/// Color table record (group data on level 1) with the given entries set.
pub fn color_table(entries: &[(u8, [u8; 3])]) -> Vec<u8> {
    let mut raw = record(5, 1, 806);
    for (index, rgb) in entries {
        let at = if *index == 255 { 38 } else { 41 + *index as usize * 3 };
        raw[at..at + 3].copy_from_slice(rgb);
    }
    raw
}

/// Mark a record as a complex group member.
pub fn as_member(mut raw: Vec<u8>) -> Vec<u8> {
    raw[0] |= 0x80;
    raw
}

/// Mark a record deleted.
pub fn as_deleted(mut raw: Vec<u8>) -> Vec<u8> {
    raw[1] |= 0x80;
    raw
}

/// Concatenate records and the `FF FF` end marker.
pub fn design_file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = records.concat();
    bytes.extend_from_slice(&[0xff, 0xff]);
    bytes
}

/// Write a design file to a temporary path.
pub fn temp_design_file(records: &[Vec<u8>]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(&design_file(records)).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
