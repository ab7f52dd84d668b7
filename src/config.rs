//! Asset description and view settings
//!
//! The asset description (`lands.json`) supplies, per elevation tier, the
//! weighted palette used to paint the base tile plus optional nature
//! decorations, and the road sprite file names keyed by shape. A built-in
//! default lets the map run without any files on disk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::palette::Palette;
use crate::terrain::LandType;

/// A sprite file plus the pixel offset it is drawn at, relative to the tile origin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteRef {
    pub file: String,
    #[serde(default)]
    pub offset: [i32; 2],
}

/// A decoration that can be placed on flat tiles of a tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NatureData {
    /// Drawn on the ground layer, over the base tile
    #[serde(default)]
    pub ground: Option<SpriteRef>,
    /// Drawn on the air layer; may rise above the tile
    #[serde(default)]
    pub air: Option<SpriteRef>,
    /// Relative pick weight among the tier's decorations
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Palette and decorations for one tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierData {
    /// Lists of `#rrggbb;weight` entries; the first list paints the base tile
    #[serde(default)]
    pub base_colors: Vec<Vec<String>>,
    #[serde(default)]
    pub nature: Vec<NatureData>,
}

impl TierData {
    fn from_palette(colors: &[&str]) -> Self {
        Self {
            base_colors: vec![colors.iter().map(|c| c.to_string()).collect()],
            nature: Vec::new(),
        }
    }
}

/// Road sprite file names, relative to `<asset dir>/roads/`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadData {
    pub end: Option<String>,
    pub full: Option<String>,
    pub edge_n: Option<String>,
    pub edge_e: Option<String>,
    pub edge_s: Option<String>,
    pub edge_w: Option<String>,
    pub t: Option<String>,
    pub cross: Option<String>,
    #[serde(rename = "cornerNE")]
    pub corner_ne: Option<String>,
    #[serde(rename = "cornerSE")]
    pub corner_se: Option<String>,
    #[serde(rename = "cornerSW")]
    pub corner_sw: Option<String>,
}

/// Settings for the render loop and viewer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Redraw period in milliseconds
    pub tick_ms: u64,
    pub initial_scale: f64,
    /// Ticks after startup during which the ground layer is always redrawn
    pub settle_ticks: u32,
    /// Probability that a flat tile with decorations available gets one
    pub nature_density: f64,
    pub seed: Option<u64>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            canvas_width: 960,
            canvas_height: 600,
            tick_ms: 50,
            initial_scale: 0.5,
            settle_ticks: 20,
            nature_density: 0.08,
            seed: None,
        }
    }
}

/// The full asset description document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandData {
    #[serde(default)]
    pub water: Option<TierData>,
    #[serde(default)]
    pub low: Option<TierData>,
    #[serde(default)]
    pub medium: Option<TierData>,
    #[serde(default)]
    pub high: Option<TierData>,
    #[serde(default)]
    pub roads: Option<RoadData>,
    #[serde(default)]
    pub view: ViewSettings,
}

impl Default for LandData {
    fn default() -> Self {
        Self {
            water: Some(TierData::from_palette(&["#1c3a7a;60", "#22438a;30", "#2b4f99;10"])),
            low: Some(TierData::from_palette(&["#c9b46a;50", "#b8a35a;30", "#928c51;20"])),
            medium: Some(TierData::from_palette(&["#3f8a2e;60", "#4b9a37;25", "#356f27;15"])),
            high: Some(TierData::from_palette(&["#1f5420;55", "#27602a;30", "#4a4a3a;15"])),
            roads: None,
            view: ViewSettings::default(),
        }
    }
}

impl LandData {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn tier(&self, land: LandType) -> Option<&TierData> {
        match land {
            LandType::Water => self.water.as_ref(),
            LandType::Low => self.low.as_ref(),
            LandType::Medium => self.medium.as_ref(),
            LandType::High => self.high.as_ref(),
        }
    }

    /// The palette that paints a tier's base tile. Missing or empty is fatal.
    pub fn palette(&self, land: LandType) -> Result<Palette, ConfigError> {
        let colors = self
            .tier(land)
            .and_then(|t| t.base_colors.first())
            .ok_or(ConfigError::MissingPalette(land.name()))?;
        let palette = Palette::parse(colors)?;
        if palette.total_weight() == 0 {
            return Err(ConfigError::MissingPalette(land.name()));
        }
        Ok(palette)
    }

    /// Decorations for a tier, empty when none are configured
    pub fn nature(&self, land: LandType) -> &[NatureData] {
        self.tier(land).map(|t| t.nature.as_slice()).unwrap_or(&[])
    }

    /// Pick weights of each tier's decorations, indexed like [`LandType::index`]
    pub fn nature_weights(&self) -> [Vec<u32>; 4] {
        LandType::all().map(|land| self.nature(land).iter().map(|n| n.weight).collect())
    }

    /// Check that every tier can paint its base tile
    pub fn validate(&self) -> Result<(), ConfigError> {
        for land in LandType::all() {
            self.palette(land)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LandData::default().validate().is_ok());
    }

    #[test]
    fn test_malformed_palette_entry_is_fatal() {
        let mut data = LandData::default();
        data.medium = Some(TierData::from_palette(&["#3f8a2e"]));
        match data.validate() {
            Err(ConfigError::PaletteEntry(entry)) => assert_eq!(entry, "#3f8a2e"),
            other => panic!("expected malformed entry, got {other:?}"),
        }

        data.medium = Some(TierData::from_palette(&["#3f8z2e;4"]));
        assert!(matches!(data.validate(), Err(ConfigError::HexColor(_))));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(LandData::from_json("{ nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_parse_document() {
        let json = r##"{
            "water":  { "baseColors": [["#1f3f8f;40"]] },
            "low":    { "baseColors": [["#c9b46a;10"]], "nature": [
                { "ground": { "file": "shrub.png" }, "air": { "file": "tree.png", "offset": [16, -40] }, "weight": 3 },
                { "air": { "file": "rock.png" } }
            ] },
            "medium": { "baseColors": [["#3f8a2e;10"]] },
            "high":   { "baseColors": [["#1f5420;10"]] },
            "roads":  { "end": "end.png", "cornerNE": "ne.png" },
            "view":   { "tickMs": 40 }
        }"##;
        let data = LandData::from_json(json).unwrap();
        assert!(data.validate().is_ok());
        assert_eq!(data.nature(LandType::Low).len(), 2);
        assert!(data.nature(LandType::Low)[0].ground.is_some());
        // weight defaults to 1
        let weights = data.nature_weights();
        assert_eq!(weights[LandType::Low.index()], vec![3, 1]);
        assert!(weights[LandType::Water.index()].is_empty());
        assert_eq!(data.nature(LandType::Low)[0].air.as_ref().unwrap().offset, [16, -40]);
        assert!(data.nature(LandType::High).is_empty());
        let roads = data.roads.unwrap();
        assert_eq!(roads.corner_ne.as_deref(), Some("ne.png"));
        assert_eq!(roads.full, None);
        assert_eq!(data.view.tick_ms, 40);
        assert_eq!(data.view.canvas_width, 960);
    }

    #[test]
    fn test_missing_tier_is_fatal() {
        let json = r##"{ "water": { "baseColors": [["#1f3f8f;40"]] } }"##;
        let data = LandData::from_json(json).unwrap();
        match data.validate() {
            Err(ConfigError::MissingPalette(name)) => assert_eq!(name, "low"),
            other => panic!("expected missing palette, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_weight_palette_is_fatal() {
        let mut data = LandData::default();
        data.high = Some(TierData::from_palette(&["#000000;0"]));
        assert!(matches!(data.palette(LandType::High), Err(ConfigError::MissingPalette("high"))));
    }
}
