//! Per-tick rendering of the ground and air layers
//!
//! Every tick walks the tiles back to front, skips the ones outside the
//! camera rectangle and asks a small precedence function which image each
//! visible tile shows. The ground layer is only repainted when something
//! about the view changed; the air layer is repainted every tick.

use image::{Pixel, Rgba, RgbaImage};
use tracing::trace;

use crate::assets::{AssetTable, Sprite};
use crate::camera::Camera;
use crate::location::{ScreenPoint, TILE_HEIGHT, TILE_WIDTH};
use crate::map::{MapGrid, Tile};

const GROUND_CLEAR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const AIR_CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// What a tile shows in one pass
#[derive(Clone, Copy, Debug)]
pub enum DrawImage<'a> {
    Blend(&'a RgbaImage),
    Base(&'a RgbaImage),
    Nature(&'a Sprite),
    Road(&'a RgbaImage),
    None,
}

impl<'a> DrawImage<'a> {
    pub fn is_none(&self) -> bool {
        matches!(self, DrawImage::None)
    }

    /// Image and offset from the tile origin, if anything is drawn
    pub fn placed(&self) -> Option<(&'a RgbaImage, (i32, i32))> {
        match *self {
            DrawImage::Blend(img) | DrawImage::Base(img) | DrawImage::Road(img) => Some((img, (0, 0))),
            DrawImage::Nature(sprite) => Some((&sprite.image, sprite.offset)),
            DrawImage::None => None,
        }
    }
}

/// Ground image: the blend for a transition tile without a road, otherwise
/// the tier's base tile.
pub fn select_ground<'a>(tile: &Tile, assets: &'a AssetTable, camera: &Camera) -> DrawImage<'a> {
    if !tile.transition.is_none() && tile.road.is_none() {
        let oriented = tile.transition.oriented(camera.orientation);
        if let Some(img) = assets.blended(tile.tier(), oriented) {
            return DrawImage::Blend(img);
        }
    }
    match assets.base(tile.tier(), tile.base_variant) {
        Some(img) => DrawImage::Base(img),
        None => DrawImage::None,
    }
}

/// Ground part of a decoration, drawn over the ground image
pub fn select_ground_detail<'a>(tile: &Tile, assets: &'a AssetTable) -> DrawImage<'a> {
    tile.nature
        .and_then(|n| assets.nature(tile.tier(), n))
        .and_then(|n| n.ground.as_ref())
        .map_or(DrawImage::None, DrawImage::Nature)
}

/// Air image: the road if the tile has one, otherwise a decoration's air part
pub fn select_air<'a>(tile: &Tile, assets: &'a AssetTable) -> DrawImage<'a> {
    if let Some(road) = &tile.road {
        return assets.road(road.road_type).map_or(DrawImage::None, DrawImage::Road);
    }
    tile.nature
        .and_then(|n| assets.nature(tile.tier(), n))
        .and_then(|n| n.air.as_ref())
        .map_or(DrawImage::None, DrawImage::Nature)
}

/// The part of projected space the canvas shows
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl CameraRect {
    pub fn new(camera: &Camera, canvas_width: u32, canvas_height: u32) -> Self {
        let half_w = canvas_width as f64 * 0.5 / camera.scale;
        let half_h = canvas_height as f64 * 0.5 / camera.scale;
        Self {
            left: camera.focus.x - half_w,
            top: camera.focus.y - half_h,
            right: camera.focus.x + half_w,
            bottom: camera.focus.y + half_h,
        }
    }

    /// Box test in projected space, `(x, y)` being the top-left corner.
    pub fn overlaps_box(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        !(y + height < self.top || y > self.bottom || x > self.right || x + width < self.left)
    }

    /// Footprint of a tile sprite whose top-left is `origin`
    pub fn overlaps_tile(&self, origin: ScreenPoint) -> bool {
        self.overlaps_box(origin.x, origin.y, f64::from(TILE_WIDTH), f64::from(TILE_HEIGHT))
    }
}

/// Maps projected coordinates onto canvas pixels
#[derive(Clone, Copy, Debug)]
struct Viewport {
    focus: ScreenPoint,
    scale: f64,
    center_x: f64,
    center_y: f64,
}

impl Viewport {
    fn new(camera: &Camera, width: u32, height: u32) -> Self {
        Self {
            focus: camera.focus,
            scale: camera.scale,
            center_x: width as f64 * 0.5,
            center_y: height as f64 * 0.5,
        }
    }

    fn to_canvas(&self, p: ScreenPoint) -> (f64, f64) {
        (
            self.center_x + (p.x - self.focus.x) * self.scale,
            self.center_y + (p.y - self.focus.y) * self.scale,
        )
    }
}

/// Draw `src` scaled by `scale` with its top-left at canvas (`x`, `y`),
/// nearest-neighbour, alpha over. Anything off the canvas is clipped.
pub fn blit_scaled(dst: &mut RgbaImage, src: &RgbaImage, x: f64, y: f64, scale: f64) {
    if scale <= 0.0 || src.width() == 0 || src.height() == 0 {
        return;
    }
    let w = src.width() as f64 * scale;
    let h = src.height() as f64 * scale;

    let x0 = x.floor().max(0.0) as i64;
    let y0 = y.floor().max(0.0) as i64;
    let x1 = ((x + w).ceil() as i64).min(dst.width() as i64);
    let y1 = ((y + h).ceil() as i64).min(dst.height() as i64);

    for dy in y0..y1 {
        let sy = ((dy as f64 + 0.5 - y) / scale).floor();
        if sy < 0.0 || sy >= src.height() as f64 {
            continue;
        }
        for dx in x0..x1 {
            let sx = ((dx as f64 + 0.5 - x) / scale).floor();
            if sx < 0.0 || sx >= src.width() as f64 {
                continue;
            }
            let s = *src.get_pixel(sx as u32, sy as u32);
            if s.0[3] == 0 {
                continue;
            }
            dst.get_pixel_mut(dx as u32, dy as u32).blend(&s);
        }
    }
}

/// Counters from one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub tick: u64,
    pub ground_redrawn: bool,
    pub ground_tiles: usize,
    pub air_tiles: usize,
}

/// Owns the two layer buffers and decides when the ground needs repainting
pub struct MapRenderer {
    ground: RgbaImage,
    air: RgbaImage,
    last_camera: Option<Camera>,
    invalidated: bool,
    settle_remaining: u32,
    ticks: u64,
    /// Skip drawing but keep counting ticks
    pub paused: bool,
}

impl MapRenderer {
    pub fn new(canvas_width: u32, canvas_height: u32, settle_ticks: u32) -> Self {
        Self {
            ground: RgbaImage::from_pixel(canvas_width, canvas_height, GROUND_CLEAR),
            air: RgbaImage::from_pixel(canvas_width, canvas_height, AIR_CLEAR),
            last_camera: None,
            invalidated: true,
            settle_remaining: settle_ticks,
            ticks: 0,
            paused: false,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.ground.dimensions()
    }

    /// Force the next tick to repaint the ground
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn ground(&self) -> &RgbaImage {
        &self.ground
    }

    pub fn air(&self) -> &RgbaImage {
        &self.air
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ground with the air layer composited on top
    pub fn frame(&self) -> RgbaImage {
        let mut frame = self.ground.clone();
        image::imageops::overlay(&mut frame, &self.air, 0, 0);
        frame
    }

    /// Run one redraw. Returns `None` while paused.
    pub fn tick(&mut self, grid: &MapGrid, camera: &Camera, assets: &AssetTable) -> Option<TickStats> {
        self.ticks += 1;
        if self.paused {
            return None;
        }

        let (width, height) = self.canvas_size();
        let rect = CameraRect::new(camera, width, height);
        let view = Viewport::new(camera, width, height);

        let moved = self.last_camera.as_ref() != Some(camera);
        let settling = self.settle_remaining > 0;
        let redraw_ground = moved || self.invalidated || settling;
        self.settle_remaining = self.settle_remaining.saturating_sub(1);

        let mut stats = TickStats {
            tick: self.ticks,
            ground_redrawn: redraw_ground,
            ..TickStats::default()
        };

        if redraw_ground {
            stats.ground_tiles = self.draw_ground(grid, camera, assets, &rect, &view);
            self.last_camera = Some(*camera);
            self.invalidated = false;
        }
        stats.air_tiles = self.draw_air(grid, assets, &rect, &view);

        trace!(?stats, "tick");
        Some(stats)
    }

    fn draw_ground(&mut self, grid: &MapGrid, camera: &Camera, assets: &AssetTable, rect: &CameraRect, view: &Viewport) -> usize {
        for p in self.ground.pixels_mut() {
            *p = GROUND_CLEAR;
        }

        let mut drawn = 0;
        for coord in grid.paint_order() {
            let tile = grid.tiles.get(coord.tx, coord.ty);
            if !rect.overlaps_tile(tile.screen) {
                continue;
            }
            let mut any = false;
            for image in [select_ground(tile, assets, camera), select_ground_detail(tile, assets)] {
                if let Some((img, offset)) = image.placed() {
                    let at = tile.screen.offset(offset.0 as f64, offset.1 as f64);
                    let (x, y) = view.to_canvas(at);
                    blit_scaled(&mut self.ground, img, x, y, view.scale);
                    any = true;
                }
            }
            if any {
                drawn += 1;
            }
        }
        drawn
    }

    fn draw_air(&mut self, grid: &MapGrid, assets: &AssetTable, rect: &CameraRect, view: &Viewport) -> usize {
        for p in self.air.pixels_mut() {
            *p = AIR_CLEAR;
        }

        let mut drawn = 0;
        for coord in grid.paint_order() {
            let tile = grid.tiles.get(coord.tx, coord.ty);
            if let Some((img, offset)) = select_air(tile, assets).placed() {
                let at = tile.screen.offset(offset.0 as f64, offset.1 as f64);
                let (w, h) = img.dimensions();
                if !rect.overlaps_box(at.x, at.y, f64::from(w), f64::from(h)) {
                    continue;
                }
                let (x, y) = view.to_canvas(at);
                blit_scaled(&mut self.air, img, x, y, view.scale);
                drawn += 1;
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NatureSprite;
    use crate::loader::in_diamond;
    use crate::location::Orientation;
    use crate::roads::{Road, RoadType};
    use crate::terrain::{LandTransition, LandType};
    use crate::tilemap::{TileCoord, Tilemap};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(64, 32, Rgba(color))
    }

    fn diamond(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_fn(64, 32, |x, y| if in_diamond(x, y) { Rgba(color) } else { AIR_CLEAR })
    }

    fn table() -> AssetTable {
        let mut t = AssetTable::new();
        for tier in LandType::all() {
            t.base[tier.index()].push(diamond([tier.index() as u8 * 60, 0, 0, 255]));
        }
        t.set_blended(LandType::Water, LandTransition::East, solid([0, 0, 200, 255]));
        t.set_road(RoadType::EndN, solid([0, 250, 0, 255]));
        t.nature[LandType::Low.index()].push(NatureSprite {
            ground: Some(Sprite::new(RgbaImage::new(8, 8), (4, 4))),
            air: Some(Sprite::new(RgbaImage::new(8, 40), (20, -30))),
        });
        t
    }

    #[test]
    fn test_ground_precedence() {
        let assets = table();
        let camera = Camera::default();
        let mut tile = Tile::new(TileCoord::new(0, 0), LandType::Water);
        assert!(matches!(select_ground(&tile, &assets, &camera), DrawImage::Base(_)));

        tile.transition = LandTransition::East;
        assert!(matches!(select_ground(&tile, &assets, &camera), DrawImage::Blend(_)));

        // a road hides the blend
        tile.road = Some(Road { road_type: RoadType::EndN, tile: tile.coord, id: 0 });
        assert!(matches!(select_ground(&tile, &assets, &camera), DrawImage::Base(_)));
    }

    #[test]
    fn test_blend_follows_camera_rotation() {
        let assets = table();
        let mut camera = Camera::default();
        let mut tile = Tile::new(TileCoord::new(0, 0), LandType::Water);
        tile.transition = LandTransition::North;
        // North seen at 90° is the East blend
        camera.orientation = Orientation::R90;
        assert!(matches!(select_ground(&tile, &assets, &camera), DrawImage::Blend(_)));
        // with no blend loaded the base tile shows instead
        camera.orientation = Orientation::R180;
        assert!(matches!(select_ground(&tile, &assets, &camera), DrawImage::Base(_)));
    }

    #[test]
    fn test_air_precedence() {
        let assets = table();
        let mut tile = Tile::new(TileCoord::new(0, 0), LandType::Low);
        assert!(select_air(&tile, &assets).is_none());

        tile.nature = Some(0);
        assert!(matches!(select_air(&tile, &assets), DrawImage::Nature(s) if s.offset == (20, -30)));
        assert!(matches!(select_ground_detail(&tile, &assets), DrawImage::Nature(s) if s.offset == (4, 4)));

        tile.road = Some(Road { road_type: RoadType::EndN, tile: tile.coord, id: 0 });
        assert!(matches!(select_air(&tile, &assets), DrawImage::Road(_)));

        // missing sprite draws nothing rather than falling through
        tile.road = Some(Road { road_type: RoadType::Cross, tile: tile.coord, id: 0 });
        assert!(select_air(&tile, &assets).is_none());
    }

    #[test]
    fn test_camera_rect_and_cull() {
        let mut camera = Camera::new(0.5);
        camera.focus = ScreenPoint::new(100.0, 50.0);
        let rect = CameraRect::new(&camera, 200, 100);
        assert_eq!(rect, CameraRect { left: -100.0, top: -50.0, right: 300.0, bottom: 150.0 });

        assert!(rect.overlaps_tile(ScreenPoint::new(0.0, 0.0)));
        assert!(!rect.overlaps_tile(ScreenPoint::new(301.0, 0.0)));
        assert!(!rect.overlaps_tile(ScreenPoint::new(-165.0, 0.0)));
        assert!(!rect.overlaps_tile(ScreenPoint::new(0.0, 160.0)));
        // a sprite hanging from a tile above the view still reaches into it
        assert!(!rect.overlaps_tile(ScreenPoint::new(0.0, -90.0)));
        assert!(rect.overlaps_box(0.0, -90.0, 8.0, 48.0));
    }

    #[test]
    fn test_air_sprite_culled_by_its_own_box() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut grid = MapGrid::new(&Tilemap::new_with(1, 1, LandType::Low), &mut rng);
        let mut assets = table();
        // a tall sprite anchored far above the tile, reaching down past it
        let tall = RgbaImage::from_pixel(8, 260, Rgba([9, 9, 9, 255]));
        assets.nature[LandType::Low.index()][0].air = Some(Sprite::new(tall, (28, -150)));
        grid.tiles.get_mut(0, 0).nature = Some(0);

        // view centred well below the tile: only the sprite's lower part is visible
        let mut camera = Camera::new(1.0);
        camera.focus = grid.tiles.get(0, 0).screen.offset(32.0, 70.0);
        let mut renderer = MapRenderer::new(40, 40, 0);
        let stats = renderer.tick(&grid, &camera, &assets).unwrap();
        assert_eq!(stats.ground_tiles, 0);
        assert_eq!(stats.air_tiles, 1);
        assert_eq!(*renderer.air().get_pixel(20, 20), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_blit_scales_and_clips() {
        let mut dst = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        blit_scaled(&mut dst, &src, 8.0, 8.0, 2.0);
        assert_eq!(*dst.get_pixel(9, 9), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(7, 7), Rgba([0, 0, 0, 255]));

        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 0]));
        blit_scaled(&mut dst, &src, 0.0, 0.0, 1.0);
        assert_eq!(*dst.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_ground_redraw_policy() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let grid = MapGrid::new(&Tilemap::new_with(4, 4, LandType::Low), &mut rng);
        let assets = table();
        let mut camera = Camera::default();
        camera.goto_tile(&grid.bounds, 2.0, 2.0);
        let mut renderer = MapRenderer::new(120, 80, 2);

        let first = renderer.tick(&grid, &camera, &assets).unwrap();
        assert!(first.ground_redrawn);
        assert!(first.ground_tiles > 0);
        // settle window
        assert!(renderer.tick(&grid, &camera, &assets).unwrap().ground_redrawn);
        // still camera, window over
        assert!(!renderer.tick(&grid, &camera, &assets).unwrap().ground_redrawn);

        camera.pan(&grid.bounds, ScreenPoint::new(4.0, 0.0));
        assert!(renderer.tick(&grid, &camera, &assets).unwrap().ground_redrawn);
        assert!(!renderer.tick(&grid, &camera, &assets).unwrap().ground_redrawn);

        renderer.invalidate();
        assert!(renderer.tick(&grid, &camera, &assets).unwrap().ground_redrawn);

        renderer.paused = true;
        assert_eq!(renderer.tick(&grid, &camera, &assets), None);
        assert_eq!(renderer.ticks(), 7);
    }

    #[test]
    fn test_center_pixel_shows_focused_tile() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let tiers = Tilemap::from_fn(3, 3, |x, y| if (x, y) == (1, 1) { LandType::High } else { LandType::Low });
        let grid = MapGrid::new(&tiers, &mut rng);
        let assets = table();
        let mut camera = Camera::new(1.0);
        camera.goto_tile(&grid.bounds, 1.0, 1.0);

        let mut renderer = MapRenderer::new(64, 64, 0);
        renderer.tick(&grid, &camera, &assets);
        // neighbouring diamonds leave the centre of the High tile alone
        assert_eq!(*renderer.ground().get_pixel(32, 32), Rgba([180, 0, 0, 255]));
    }
}
