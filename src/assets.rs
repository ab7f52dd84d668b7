//! Every image the renderer can draw, built once at load time
//!
//! The table is owned by whoever drives rendering and handed to the renderer
//! by reference. Slots that failed to load stay empty and draw nothing.

use image::RgbaImage;

use crate::roads::RoadType;
use crate::terrain::{LandTransition, LandType};

/// An image plus where to put it relative to the tile sprite origin
#[derive(Clone, Debug)]
pub struct Sprite {
    pub image: RgbaImage,
    pub offset: (i32, i32),
}

impl Sprite {
    pub fn new(image: RgbaImage, offset: (i32, i32)) -> Self {
        Self { image, offset }
    }
}

/// One decoration: optional ground and air parts
#[derive(Clone, Debug, Default)]
pub struct NatureSprite {
    pub ground: Option<Sprite>,
    pub air: Option<Sprite>,
}

#[derive(Clone, Debug)]
pub struct AssetTable {
    /// Procedural base tiles per tier, several variants each
    pub base: [Vec<RgbaImage>; 4],
    /// Blended tiles per lower tier, indexed by transition code
    pub blended: [Vec<Option<RgbaImage>>; 4],
    /// Decorations per tier, parallel to the configured nature list
    pub nature: [Vec<NatureSprite>; 4],
    pub roads: Vec<Option<RgbaImage>>,
}

impl Default for AssetTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTable {
    pub fn new() -> Self {
        Self {
            base: Default::default(),
            blended: std::array::from_fn(|_| vec![None; LandTransition::BLENDED.len()]),
            nature: Default::default(),
            roads: vec![None; RoadType::COUNT],
        }
    }

    /// Base sprite for a tier; variants that are missing fall back to the first
    pub fn base(&self, tier: LandType, variant: usize) -> Option<&RgbaImage> {
        let variants = &self.base[tier.index()];
        variants.get(variant).or_else(|| variants.first())
    }

    pub fn blended(&self, tier: LandType, transition: LandTransition) -> Option<&RgbaImage> {
        let code = usize::try_from(transition.code()).ok()?;
        self.blended[tier.index()].get(code)?.as_ref()
    }

    pub fn set_blended(&mut self, tier: LandType, transition: LandTransition, image: RgbaImage) {
        let Ok(code) = usize::try_from(transition.code()) else {
            return;
        };
        if let Some(slot) = self.blended[tier.index()].get_mut(code) {
            *slot = Some(image);
        }
    }

    pub fn nature(&self, tier: LandType, index: usize) -> Option<&NatureSprite> {
        self.nature[tier.index()].get(index)
    }

    pub fn road(&self, road_type: RoadType) -> Option<&RgbaImage> {
        self.roads.get(road_type.index())?.as_ref()
    }

    pub fn set_road(&mut self, road_type: RoadType, image: RgbaImage) {
        if let Some(slot) = self.roads.get_mut(road_type.index()) {
            *slot = Some(image);
        }
    }

    /// Number of blended tiles present
    pub fn blended_count(&self) -> usize {
        self.blended.iter().flatten().filter(|b| b.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_empty_table_draws_nothing() {
        let table = AssetTable::new();
        assert!(table.base(LandType::Low, 0).is_none());
        assert!(table.blended(LandType::Low, LandTransition::North).is_none());
        assert!(table.road(RoadType::Cross).is_none());
        assert_eq!(table.blended_count(), 0);
    }

    #[test]
    fn test_base_variant_falls_back() {
        let mut table = AssetTable::new();
        table.base[LandType::High.index()].push(RgbaImage::from_pixel(64, 32, Rgba([1, 2, 3, 255])));
        assert!(table.base(LandType::High, 2).is_some());
    }

    #[test]
    fn test_blended_slots() {
        let mut table = AssetTable::new();
        table.set_blended(LandType::Water, LandTransition::SwDown, RgbaImage::new(64, 32));
        table.set_blended(LandType::Water, LandTransition::None, RgbaImage::new(64, 32));
        assert!(table.blended(LandType::Water, LandTransition::SwDown).is_some());
        assert!(table.blended(LandType::Water, LandTransition::None).is_none());
        assert!(table.blended(LandType::Water, LandTransition::North).is_none());
        assert_eq!(table.blended_count(), 1);
    }
}
