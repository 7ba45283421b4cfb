//! Color tables.
//!
//! Every element carries an 8-bit color index. The index resolves through the
//! session's active color table, which starts out as [`DEFAULT_PALETTE`] and
//! is replaced by the last color table record found in the file.

use std::fmt;

/// RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

/// The first sixteen colors of the stock Microstation palette.
const BASE_COLORS: [Rgb; 16] = [
    Rgb::new(255, 255, 255),
    Rgb::new(0, 0, 255),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 0, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 0, 255),
    Rgb::new(255, 127, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(64, 64, 64),
    Rgb::new(192, 192, 192),
    Rgb::new(254, 0, 96),
    Rgb::new(160, 224, 0),
    Rgb::new(0, 254, 160),
    Rgb::new(128, 0, 160),
    Rgb::new(176, 176, 176),
    Rgb::new(0, 240, 240),
];

/// Hue pattern of the shaded ramps after the base colors, as fractions of 255.
const RAMP_HUES: [[u16; 3]; 8] = [
    [255, 255, 255],
    [0, 0, 255],
    [0, 255, 0],
    [255, 0, 0],
    [255, 255, 0],
    [255, 0, 255],
    [255, 127, 0],
    [0, 255, 255],
];

const fn build_default_palette() -> [Rgb; 256] {
    let mut table = [Rgb::new(0, 0, 0); 256];
    let mut i = 0;
    while i < 16 {
        table[i] = BASE_COLORS[i];
        i += 1;
    }
    while i < 256 {
        let group = (i - 16) / 8;
        let hue = RAMP_HUES[(i - 16) % 8];
        let intensity = (240 - group * 7) as u16;
        table[i] = Rgb::new(
            (hue[0] * intensity / 255) as u8,
            (hue[1] * intensity / 255) as u8,
            (hue[2] * intensity / 255) as u8,
        );
        i += 1;
    }
    table
}

/// Palette used until a color table record is read.
pub const DEFAULT_PALETTE: [Rgb; 256] = build_default_palette();

/// A full 256 entry color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: [Rgb; 256],
}

impl Default for ColorTable {
    fn default() -> Self {
        ColorTable {
            entries: DEFAULT_PALETTE,
        }
    }
}

impl ColorTable {
    pub fn new(entries: [Rgb; 256]) -> Self {
        ColorTable { entries }
    }

    /// Resolve a color index.
    pub fn get(&self, index: u8) -> Rgb {
        self.entries[index as usize]
    }

    pub fn set(&mut self, index: u8, color: Rgb) {
        self.entries[index as usize] = color;
    }

    pub fn entries(&self) -> &[Rgb; 256] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rgb> {
        self.entries.iter()
    }
}
