//! Building the asset table
//!
//! Base tiles are painted from the tier palettes. Once every base tile has
//! been produced a latch opens and the blended transition tiles are generated
//! from them, exactly once. Road and decoration sprites are read from disk;
//! a sprite that fails to decode is logged and its slot left empty.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::assets::{AssetTable, NatureSprite, Sprite};
use crate::blend::blend_tile;
use crate::config::{LandData, RoadData, SpriteRef};
use crate::error::{AssetError, ConfigError};
use crate::location::{TILE_HEIGHT, TILE_WIDTH};
use crate::map::BASE_VARIANTS;
use crate::palette::Palette;
use crate::roads::RoadType;
use crate::terrain::{LandTransition, LandType};

/// Times the palette bucket is shuffled before painting
const SHUFFLE_PASSES: usize = 3;

const STUB_RIM: Rgba<u8> = Rgba([0xb8, 0xb8, 0xb8, 255]);
const STUB_FILL: Rgba<u8> = Rgba([0x28, 0x30, 0x28, 255]);

/// Counts outstanding base images. Opens exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadLatch {
    remaining: usize,
}

impl LoadLatch {
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }

    /// Mark one image done. True only on the call that brings the count to zero.
    pub fn count_down(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn is_open(&self) -> bool {
        self.remaining == 0
    }
}

/// True for pixels whose centre lies inside the tile diamond
/// (0,16)-(32,0)-(64,16)-(32,32).
pub fn in_diamond(px: u32, py: u32) -> bool {
    let hw = TILE_WIDTH as f64 / 2.0;
    let hh = TILE_HEIGHT as f64 / 2.0;
    let dx = (px as f64 + 0.5 - hw).abs() / hw;
    let dy = (py as f64 + 0.5 - hh).abs() / hh;
    dx + dy <= 1.0
}

/// Paint one base tile: the diamond is filled pixel by pixel from a shuffled
/// bucket of palette colours, cycling when the bucket runs out.
pub fn paint_base_tile<R: Rng>(palette: &Palette, rng: &mut R) -> RgbaImage {
    let bucket = palette.bucket(rng, SHUFFLE_PASSES);
    let mut image = RgbaImage::new(TILE_WIDTH, TILE_HEIGHT);
    if bucket.is_empty() {
        return image;
    }

    let mut next = 0;
    for py in 0..TILE_HEIGHT {
        for px in 0..TILE_WIDTH {
            if in_diamond(px, py) {
                image.put_pixel(px, py, bucket[next % bucket.len()]);
                next += 1;
            }
        }
    }
    image
}

/// The stub drawn for unconnected roads: a small grey-rimmed diamond.
pub fn road_stub() -> RgbaImage {
    // inner diamond (16,16)-(32,8)-(48,16)-(32,24)
    let (cx, cy, hw, hh) = (32.0, 16.0, 16.0, 8.0);
    // pixels per unit of the normalised diamond metric, measured across an edge
    let edge_scale = hw * hh / f64::hypot(hw, hh);
    let half_line = 1.5;

    let mut image = RgbaImage::new(TILE_WIDTH, TILE_HEIGHT);
    for (px, py, pixel) in image.enumerate_pixels_mut() {
        let u = (px as f64 + 0.5 - cx).abs() / hw + (py as f64 + 0.5 - cy).abs() / hh;
        if u <= 1.0 {
            *pixel = STUB_FILL;
        } else if (u - 1.0) * edge_scale <= half_line {
            *pixel = STUB_RIM;
        }
    }
    image
}

pub fn load_sprite(path: &Path) -> Result<RgbaImage, AssetError> {
    let image = image::open(path).map_err(|source| AssetError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Decode a sprite, logging and swallowing failures.
fn load_or_warn(path: &Path) -> Option<RgbaImage> {
    match load_sprite(path) {
        Ok(image) => {
            debug!(path = %path.display(), "sprite loaded");
            Some(image)
        }
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

/// Generate the twelve blended tiles for every tier that has one above it.
pub fn generate_blends<R: Rng>(table: &mut AssetTable, rng: &mut R) -> usize {
    let mut made = 0;
    for lower in [LandType::Water, LandType::Low, LandType::Medium] {
        let Some(upper) = lower.upper() else {
            continue;
        };
        let (Some(lower_img), Some(upper_img)) = (table.base(lower, 0).cloned(), table.base(upper, 0).cloned()) else {
            warn!(tier = lower.name(), "base tiles missing, no blends generated");
            continue;
        };
        for transition in LandTransition::BLENDED {
            let blended = blend_tile(&lower_img, &upper_img, transition, rng);
            table.set_blended(lower, transition, blended);
            made += 1;
        }
    }
    info!(blended = made, "generated transition blends");
    made
}

/// Paint every tier's base variants, counting the latch down as each one is
/// finished; blending runs when it opens.
pub fn load_base_tiles<R: Rng>(data: &LandData, table: &mut AssetTable, rng: &mut R) -> Result<(), ConfigError> {
    let mut latch = LoadLatch::new(LandType::all().len() * BASE_VARIANTS);

    let palettes = LandType::all()
        .into_iter()
        .map(|tier| data.palette(tier))
        .collect::<Result<Vec<_>, _>>()?;

    for variant in 0..BASE_VARIANTS {
        for (tier, palette) in LandType::all().into_iter().zip(&palettes) {
            table.base[tier.index()].push(paint_base_tile(palette, rng));
            debug!(tier = tier.name(), variant, "base tile painted");
            if latch.count_down() {
                generate_blends(table, rng);
            }
        }
    }
    Ok(())
}

/// Road sprites from `<dir>/<file>` plus the mirrored variants derived from them.
pub fn load_road_sprites(roads: &RoadData, dir: &Path, table: &mut AssetTable) {
    table.set_road(RoadType::None, road_stub());

    let load = |file: &Option<String>| file.as_ref().and_then(|f| load_or_warn(&dir.join(f)));

    if let Some(end) = load(&roads.end) {
        table.set_road(RoadType::EndE, imageops::flip_horizontal(&end));
        table.set_road(RoadType::EndS, imageops::rotate180(&end));
        table.set_road(RoadType::EndW, imageops::flip_vertical(&end));
        table.set_road(RoadType::EndN, end);
    }
    if let Some(full) = load(&roads.full) {
        table.set_road(RoadType::EW, imageops::flip_horizontal(&full));
        table.set_road(RoadType::NS, full);
    }
    if let Some(t) = load(&roads.t) {
        table.set_road(RoadType::TE, imageops::flip_horizontal(&t));
        table.set_road(RoadType::TS, imageops::rotate180(&t));
        table.set_road(RoadType::TW, imageops::flip_vertical(&t));
        table.set_road(RoadType::TN, t);
    }
    if let Some(se) = load(&roads.corner_se) {
        table.set_road(RoadType::CornerNW, imageops::flip_horizontal(&se));
        table.set_road(RoadType::CornerSE, se);
    }

    let singles = [
        (&roads.edge_n, RoadType::N),
        (&roads.edge_e, RoadType::E),
        (&roads.edge_s, RoadType::S),
        (&roads.edge_w, RoadType::W),
        (&roads.cross, RoadType::Cross),
        (&roads.corner_ne, RoadType::CornerNE),
        (&roads.corner_sw, RoadType::CornerSW),
    ];
    for (file, road_type) in singles {
        if let Some(image) = load(file) {
            table.set_road(road_type, image);
        }
    }

    let loaded = table.roads.iter().filter(|r| r.is_some()).count();
    info!(loaded, total = RoadType::COUNT, "road sprites ready");
}

fn load_sprite_ref(dir: &Path, sprite: &Option<SpriteRef>) -> Option<Sprite> {
    let sprite = sprite.as_ref()?;
    let image = load_or_warn(&dir.join(&sprite.file))?;
    Some(Sprite::new(image, (sprite.offset[0], sprite.offset[1])))
}

/// Decoration sprites from `<dir>/<file>`. Every configured decoration gets
/// a slot, even when its images fail, so indices stay aligned with the
/// configured list.
pub fn load_nature_sprites(data: &LandData, dir: &Path, table: &mut AssetTable) {
    for tier in LandType::all() {
        table.nature[tier.index()] = data
            .nature(tier)
            .iter()
            .map(|n| NatureSprite {
                ground: load_sprite_ref(dir, &n.ground),
                air: load_sprite_ref(dir, &n.air),
            })
            .collect();
    }
}

/// Build the complete table. Without an asset directory only the procedural
/// images are produced.
pub fn load_assets<R: Rng>(data: &LandData, asset_dir: Option<&Path>, rng: &mut R) -> Result<AssetTable, ConfigError> {
    let mut table = AssetTable::new();
    load_base_tiles(data, &mut table, rng)?;

    match asset_dir {
        Some(dir) => {
            if let Some(roads) = &data.roads {
                load_road_sprites(roads, &dir.join("roads"), &mut table);
            } else {
                table.set_road(RoadType::None, road_stub());
            }
            load_nature_sprites(data, &dir.join("nature"), &mut table);
        }
        None => table.set_road(RoadType::None, road_stub()),
    }

    Ok(table)
}
