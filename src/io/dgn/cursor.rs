//! Bounds-checked field access over a record buffer.
//!
//! Every fixed-offset field of a record goes through [`ByteCursor`] (reads)
//! or [`ByteCursorMut`] (writes). An access that does not fit in the buffer
//! yields [`DgnError::OutOfBounds`] instead of touching neighbouring memory.
//!
//! Besides plain little-endian words the format uses a "middle-endian"
//! 32-bit integer: two little-endian 16-bit words, high word first.

use super::float::{ieee_to_vax, vax_to_ieee};
use crate::error::{DgnError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Decode a middle-endian 32-bit integer.
pub fn decode_int32(b: &[u8; 4]) -> i32 {
    let hi = LittleEndian::read_u16(&b[0..2]) as u32;
    let lo = LittleEndian::read_u16(&b[2..4]) as u32;
    ((hi << 16) | lo) as i32
}

/// Encode a middle-endian 32-bit integer.
pub fn encode_int32(v: i32) -> [u8; 4] {
    let v = v as u32;
    let mut out = [0u8; 4];
    LittleEndian::write_u16(&mut out[0..2], (v >> 16) as u16);
    LittleEndian::write_u16(&mut out[2..4], v as u16);
    out
}

/// Read-only view over a record.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    /// `true` if `len` bytes starting at `offset` are inside the buffer.
    pub fn has(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .map(|end| end <= self.buf.len())
            .unwrap_or(false)
    }

    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        if !self.has(offset, len) {
            return Err(DgnError::OutOfBounds {
                offset,
                len,
                size: self.buf.len(),
            });
        }
        Ok(&self.buf[offset..offset + len])
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes_at(offset, N)?);
        Ok(out)
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.bytes_at(offset, 2)?))
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.bytes_at(offset, 2)?))
    }

    pub fn u32_le_at(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes_at(offset, 4)?))
    }

    pub fn i32_le_at(&self, offset: usize) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.bytes_at(offset, 4)?))
    }

    /// Middle-endian signed integer (coordinates, angles, multipliers).
    pub fn int32_at(&self, offset: usize) -> Result<i32> {
        Ok(decode_int32(&self.array_at::<4>(offset)?))
    }

    /// Middle-endian unsigned integer (range block values).
    pub fn uint32_at(&self, offset: usize) -> Result<u32> {
        Ok(self.int32_at(offset)? as u32)
    }

    pub fn vax_at(&self, offset: usize) -> Result<f64> {
        Ok(vax_to_ieee(&self.array_at::<8>(offset)?))
    }
}

/// Mutable view over a record being built or patched.
#[derive(Debug)]
pub struct ByteCursorMut<'a> {
    buf: &'a mut [u8],
}

impl<'a> ByteCursorMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        ByteCursorMut { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn reader(&self) -> ByteCursor<'_> {
        ByteCursor::new(self.buf)
    }

    fn slot(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let size = self.buf.len();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(&mut self.buf[offset..end]),
            _ => Err(DgnError::OutOfBounds { offset, len, size }),
        }
    }

    pub fn put_bytes(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.slot(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn put_u8(&mut self, offset: usize, v: u8) -> Result<()> {
        self.slot(offset, 1)?[0] = v;
        Ok(())
    }

    /// OR bits into a single byte.
    pub fn or_u8(&mut self, offset: usize, bits: u8) -> Result<()> {
        self.slot(offset, 1)?[0] |= bits;
        Ok(())
    }

    pub fn put_u16(&mut self, offset: usize, v: u16) -> Result<()> {
        LittleEndian::write_u16(self.slot(offset, 2)?, v);
        Ok(())
    }

    pub fn put_u32_le(&mut self, offset: usize, v: u32) -> Result<()> {
        LittleEndian::write_u32(self.slot(offset, 4)?, v);
        Ok(())
    }

    pub fn put_int32(&mut self, offset: usize, v: i32) -> Result<()> {
        self.put_bytes(offset, &encode_int32(v))
    }

    pub fn put_vax(&mut self, offset: usize, v: f64) -> Result<()> {
        self.put_bytes(offset, &ieee_to_vax(v))
    }
}
