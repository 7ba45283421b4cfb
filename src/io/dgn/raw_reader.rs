//! Record framing: header parsing and end-of-file detection.

use crate::error::{DgnError, Result};
use std::io::{ErrorKind, Read};

/// Largest record the 16-bit word count can describe.
pub const MAX_ELEMENT_SIZE: usize = 65540;

/// Header of the record currently held by a [`RawRecordReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    pub element_type: u8,
    pub level: u8,
    /// Record size in bytes, header included
    pub size: usize,
}

impl RawHeader {
    /// Parse a 4 byte record header.
    pub fn parse(head: &[u8; 4]) -> RawHeader {
        let words = head[2] as usize + head[3] as usize * 256;
        RawHeader {
            element_type: head[1] & 0x7f,
            level: head[0] & 0x3f,
            size: words * 2 + 4,
        }
    }
}

/// `true` if the two bytes are the end-of-file marker.
pub fn is_eof_marker(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xff
}

/// Reads whole records into a working buffer sized for the largest legal
/// record, and counts them.
#[derive(Debug)]
pub struct RawRecordReader {
    buffer: Vec<u8>,
    len: usize,
    next_element_id: usize,
}

impl Default for RawRecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRecordReader {
    pub fn new() -> Self {
        RawRecordReader {
            buffer: vec![0u8; MAX_ELEMENT_SIZE],
            len: 0,
            next_element_id: 0,
        }
    }

    /// Bytes of the last record read.
    pub fn record(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Sequence id the next record read will get.
    pub fn next_element_id(&self) -> usize {
        self.next_element_id
    }

    pub fn set_next_element_id(&mut self, id: usize) {
        self.next_element_id = id;
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at the end-of-file marker or at the physical end of
    /// the stream.
    pub fn read_next<R: Read>(&mut self, stream: &mut R) -> Result<Option<RawHeader>> {
        let mut head = [0u8; 4];
        let got = read_up_to(stream, &mut head)?;
        if got == 0 || is_eof_marker(&head[..got]) {
            self.len = 0;
            return Ok(None);
        }
        if got < 4 {
            return Err(DgnError::Truncated {
                expected: 4,
                actual: got,
            });
        }

        let header = RawHeader::parse(&head);
        if header.size > self.buffer.len() {
            return Err(DgnError::InvalidFormat(format!(
                "record of {} bytes exceeds the {} byte maximum",
                header.size,
                self.buffer.len()
            )));
        }

        self.buffer[..4].copy_from_slice(&head);
        let body = &mut self.buffer[4..header.size];
        let got = read_up_to(stream, body)?;
        if got != body.len() {
            return Err(DgnError::Truncated {
                expected: header.size,
                actual: got + 4,
            });
        }

        self.len = header.size;
        self.next_element_id += 1;
        Ok(Some(header))
    }
}

/// Read until `buf` is full or the stream ends, returning the byte count.
fn read_up_to<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match stream.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}
