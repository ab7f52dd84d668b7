//! Weighted color palettes for procedurally textured base tiles
//!
//! A palette entry reads `#928c51;127`: use this color about 127 times. The
//! entries are expanded into a bucket, shuffled, and dealt out pixel by pixel
//! across the tile diamond so every tier gets a speckled, hand-painted look.

use image::Rgba;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ConfigError;

/// Parse `#rrggbb` (leading `#` optional) into an opaque pixel.
pub fn parse_hex(hex: &str) -> Result<Rgba<u8>, ConfigError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ConfigError::HexColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ConfigError::HexColor(hex.to_string()))
    };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

/// One `color;weight` pair
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteEntry {
    pub color: Rgba<u8>,
    pub weight: usize,
}

impl PaletteEntry {
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let (color, weight) = entry
            .split_once(';')
            .ok_or_else(|| ConfigError::PaletteEntry(entry.to_string()))?;
        let weight = weight
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::PaletteEntry(entry.to_string()))?;
        Ok(Self {
            color: parse_hex(color)?,
            weight,
        })
    }
}

/// A parsed palette for one tier
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let entries = entries
            .iter()
            .map(|e| PaletteEntry::parse(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Expand into a shuffled bucket of pixels. Shuffled `passes` times.
    pub fn bucket<R: Rng>(&self, rng: &mut R, passes: usize) -> Vec<Rgba<u8>> {
        let mut bucket: Vec<Rgba<u8>> = self
            .entries
            .iter()
            .flat_map(|e| std::iter::repeat(e.color).take(e.weight))
            .collect();
        for _ in 0..passes {
            bucket.shuffle(rng);
        }
        bucket
    }

    /// Total weight; zero means the palette cannot paint anything
    pub fn total_weight(&self) -> usize {
        self.entries.iter().map(|e| e.weight).sum()
    }
}
