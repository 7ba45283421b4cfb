//! Radix-50 name packing used by cell names and cell library descriptions.
//!
//! Three characters are packed into one 16-bit word as `c0*1600 + c1*40 + c2`
//! over the alphabet `" ABCDEFGHIJKLMNOPQRSTUVWXYZ$. 0123456789"`.

fn decode_char(value: u16) -> char {
    match value {
        1..=26 => (b'A' + (value - 1) as u8) as char,
        27 => '$',
        28 => '.',
        30..=39 => (b'0' + (value - 30) as u8) as char,
        _ => ' ',
    }
}

fn encode_char(c: u8) -> u16 {
    match c {
        b'$' => 27,
        b'.' => 28,
        b' ' => 29,
        b'0'..=b'9' => (c - b'0') as u16 + 30,
        b'a'..=b'z' => (c - b'a') as u16 + 1,
        b'A'..=b'Z' => (c - b'A') as u16 + 1,
        _ => 0,
    }
}

/// Unpack a word into three characters.
pub fn rad50_to_ascii(word: u16) -> String {
    let mut out = String::with_capacity(3);
    let mut rem = word;
    for divisor in [1600u16, 40, 1] {
        let value = rem / divisor;
        rem -= value * divisor;
        out.push(decode_char(value));
    }
    out
}

/// Pack up to three characters into a word; a short input is padded with
/// the value 0 (decodes as a space).
pub fn ascii_to_rad50(text: &str) -> u16 {
    let mut value: u16 = 0;
    let bytes = text.as_bytes();
    for i in 0..3 {
        value = value.wrapping_mul(40);
        if let Some(&c) = bytes.get(i) {
            value = value.wrapping_add(encode_char(c));
        }
    }
    value
}
