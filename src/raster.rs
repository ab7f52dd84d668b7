//! Terrain rasters: one pixel per tile, tier keyed by the green channel
//!
//! The four terrain colours are told apart by green alone. Any other green
//! value is rejected rather than guessed.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::info;

use crate::error::TerrainError;
use crate::terrain::LandType;
use crate::tilemap::Tilemap;

/// Green channel of each tier's terrain colour
pub const GREEN_WATER: u8 = 85;
pub const GREEN_LOW: u8 = 146;
pub const GREEN_MEDIUM: u8 = 138;
pub const GREEN_HIGH: u8 = 130;

pub fn tier_from_green(green: u8) -> Option<LandType> {
    match green {
        GREEN_WATER => Some(LandType::Water),
        GREEN_LOW => Some(LandType::Low),
        GREEN_MEDIUM => Some(LandType::Medium),
        GREEN_HIGH => Some(LandType::High),
        _ => None,
    }
}

/// A colour that decodes back to `tier`; used when writing rasters
pub fn tier_color(tier: LandType) -> Rgba<u8> {
    match tier {
        LandType::Water => Rgba([38, GREEN_WATER, 160, 255]),
        LandType::Low => Rgba([201, GREEN_LOW, 90, 255]),
        LandType::Medium => Rgba([76, GREEN_MEDIUM, 46, 255]),
        LandType::High => Rgba([110, GREEN_HIGH, 100, 255]),
    }
}

/// Decode a tier grid from an image already in memory.
pub fn tiers_from_image(image: &RgbaImage) -> Result<Tilemap<LandType>, TerrainError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TerrainError::Empty);
    }

    let mut tiers = Tilemap::new(width as usize, height as usize);
    for (x, y, pixel) in image.enumerate_pixels() {
        let green = pixel.0[1];
        let tier = tier_from_green(green).ok_or(TerrainError::UnknownColor { x, y, green })?;
        tiers.set(x as usize, y as usize, tier);
    }
    Ok(tiers)
}

/// Read a terrain raster from disk.
pub fn load_tiers(path: &Path) -> Result<Tilemap<LandType>, TerrainError> {
    let image = image::open(path)?.to_rgba8();
    let tiers = tiers_from_image(&image)?;
    info!(path = %path.display(), width = tiers.width, height = tiers.height, "terrain raster loaded");
    Ok(tiers)
}

/// Encode a tier grid as a raster that [`tiers_from_image`] reads back.
pub fn tiers_to_image(tiers: &Tilemap<LandType>) -> RgbaImage {
    RgbaImage::from_fn(tiers.width as u32, tiers.height as u32, |x, y| {
        tier_color(*tiers.get(x as usize, y as usize))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_green_lookup() {
        assert_eq!(tier_from_green(85), Some(LandType::Water));
        assert_eq!(tier_from_green(146), Some(LandType::Low));
        assert_eq!(tier_from_green(138), Some(LandType::Medium));
        assert_eq!(tier_from_green(130), Some(LandType::High));
        assert_eq!(tier_from_green(0), None);
    }

    #[test]
    fn test_decode_grid_from_pixels() {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 85, 0, 255]));
        image.put_pixel(2, 1, Rgba([0, 130, 0, 255]));
        let tiers = tiers_from_image(&image).unwrap();
        assert_eq!((tiers.width, tiers.height), (3, 2));
        assert_eq!(*tiers.get(0, 0), LandType::Water);
        assert_eq!(*tiers.get(2, 1), LandType::High);
    }

    #[test]
    fn test_unknown_color_fails() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 85, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 200, 0, 255]));
        match tiers_from_image(&image) {
            Err(TerrainError::UnknownColor { x, y, green }) => assert_eq!((x, y, green), (1, 0, 200)),
            other => panic!("expected unknown color, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_image_fails() {
        assert!(matches!(tiers_from_image(&RgbaImage::new(0, 0)), Err(TerrainError::Empty)));
    }

    #[test]
    fn test_written_raster_reads_back() {
        let tiers = Tilemap::from_fn(4, 3, |x, y| LandType::all()[(x + y) % 4]);
        let back = tiers_from_image(&tiers_to_image(&tiers)).unwrap();
        assert!(tiers.iter().all(|(x, y, t)| back.get(x, y) == t));
    }
}
