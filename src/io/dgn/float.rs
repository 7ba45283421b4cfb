//! VAX D-float codec.
//!
//! Ellipse axes, 3D origins, view matrices and the TCB origin are stored as
//! 8-byte VAX D-floats: sign, 8-bit exponent biased by 129 and a 55-bit
//! mantissa, written as four little-endian 16-bit words with the most
//! significant word first.

use byteorder::{ByteOrder, LittleEndian};

/// Two 32-bit halves of a 64-bit pattern, most significant first.
#[derive(Clone, Copy)]
struct Halves {
    hi: u32,
    lo: u32,
}

impl Halves {
    /// Reassemble halves from the VAX word order.
    fn from_vax(bytes: &[u8; 8]) -> Self {
        let w = |i: usize| LittleEndian::read_u16(&bytes[i * 2..i * 2 + 2]) as u32;
        Halves {
            hi: (w(0) << 16) | w(1),
            lo: (w(2) << 16) | w(3),
        }
    }

    fn to_vax(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        LittleEndian::write_u16(&mut out[0..2], (self.hi >> 16) as u16);
        LittleEndian::write_u16(&mut out[2..4], self.hi as u16);
        LittleEndian::write_u16(&mut out[4..6], (self.lo >> 16) as u16);
        LittleEndian::write_u16(&mut out[6..8], self.lo as u16);
        out
    }
}

/// Decode a VAX D-float into an IEEE double.
pub fn vax_to_ieee(bytes: &[u8; 8]) -> f64 {
    let Halves { hi, lo } = Halves::from_vax(bytes);

    let sign = hi & 0x8000_0000;
    let mut exponent = (hi >> 23) & 0xff;
    if exponent != 0 {
        exponent = exponent + 1023 - 129;
    }

    // Drop three mantissa bits, keeping a sticky bit when any was set.
    let rounding = lo & 0x0000_0007;
    let mut new_lo = ((lo >> 3) & 0x1fff_ffff) | (hi << 29);
    if rounding != 0 {
        new_lo |= 0x0000_0001;
    }
    let new_hi = ((hi >> 3) & 0x000f_ffff) | (exponent << 20) | sign;

    f64::from_bits(((new_hi as u64) << 32) | new_lo as u64)
}

/// Encode an IEEE double as a VAX D-float.
///
/// Values beyond the VAX range saturate to the largest magnitude of the same
/// sign; values below it (and negative zero) become all zero bytes.
pub fn ieee_to_vax(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let hi = (bits >> 32) as u32;
    let lo = bits as u32;

    let sign = hi & 0x8000_0000;
    let mut exponent = ((hi >> 20) & 0x7ff) as i32;
    if exponent != 0 {
        exponent = exponent - 1023 + 129;
    }

    if exponent > 255 {
        return if sign != 0 {
            [0xff; 8]
        } else {
            [0xff, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        };
    }
    if exponent <= 0 {
        return [0u8; 8];
    }

    let new_hi = (((hi << 3) | (lo >> 29)) & 0x007f_ffff) | ((exponent as u32) << 23) | sign;
    let new_lo = lo << 3;
    Halves {
        hi: new_hi,
        lo: new_lo,
    }
    .to_vax()
}

/// Decode a VAX D-float from the first eight bytes of `bytes`.
///
/// Returns `None` when fewer than eight bytes are available.
pub fn vax_slice_to_ieee(bytes: &[u8]) -> Option<f64> {
    let arr: &[u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(vax_to_ieee(arr))
}
