//! The map as a whole: grid, camera and road network kept in step
//!
//! All load-time passes (classification, decorations, initial roads) go
//! through here before the first render. Camera operations return an event
//! when something changed so the caller can invalidate cached layers.

use rand::Rng;
use tracing::info;

use crate::camera::{Camera, CameraEvent};
use crate::location::{screen_to_tile, Orientation, ScreenPoint, TILE_STEP_X};
use crate::map::MapGrid;
use crate::roads::{RoadNetwork, TileRect};
use crate::terrain::LandType;
use crate::tilemap::{TileCoord, Tilemap};

pub struct Planet {
    pub grid: MapGrid,
    pub camera: Camera,
    pub roads: RoadNetwork,
    /// Drag in progress, not yet applied to the camera
    drag: Option<ScreenPoint>,
    /// A road edit changed tiles the ground layer shows
    ground_dirty: bool,
}

impl Planet {
    pub fn from_tiers<R: Rng>(tiers: &Tilemap<LandType>, initial_scale: f64, rng: &mut R) -> Self {
        let grid = MapGrid::new(tiers, rng);
        let mut camera = Camera::new(initial_scale);
        camera.goto_tile(&grid.bounds, grid.width() as f64 / 2.0, grid.height() as f64 / 2.0);

        let summary = grid.summary();
        info!(
            flat = summary.flat,
            blended = summary.blended(),
            "planet ready, {}x{} tiles",
            grid.width(),
            grid.height()
        );

        Self {
            grid,
            camera,
            roads: RoadNetwork::new(),
            drag: None,
            ground_dirty: false,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.camera.orientation
    }

    /// The camera as it should be drawn, including any drag in progress.
    pub fn view(&self) -> Camera {
        let mut view = self.camera;
        if let Some(delta) = self.drag {
            view.focus = self.camera.panned(&self.grid.bounds, delta);
        }
        view
    }

    /// Preview a drag. `delta` is the total drag so far in canvas pixels.
    pub fn pan(&mut self, delta: ScreenPoint) {
        self.drag = Some(delta);
    }

    /// Apply the previewed drag to the camera.
    pub fn commit_pan(&mut self) -> Option<CameraEvent> {
        let delta = self.drag.take()?;
        self.camera.pan(&self.grid.bounds, delta)
    }

    pub fn zoom(&mut self, zoom_in: bool) -> Option<CameraEvent> {
        self.camera.zoom(zoom_in)
    }

    pub fn rotate_right(&mut self) -> CameraEvent {
        self.set_orientation(self.orientation().rotated_right())
    }

    pub fn rotate_left(&mut self) -> CameraEvent {
        self.set_orientation(self.orientation().rotated_left())
    }

    /// Switch rotation, keeping the same tile under the centre of the view.
    /// Every screen position moves and every road is reshaped.
    pub fn set_orientation(&mut self, orientation: Orientation) -> CameraEvent {
        let bounds = self.grid.bounds;
        let anchor = self.camera.focus.offset(-TILE_STEP_X, 0.0);
        let (tx, ty) = screen_to_tile(self.camera.orientation, &bounds, anchor);

        self.camera.orientation = orientation;
        self.grid.orientate(orientation);
        self.camera.goto_tile(&bounds, tx, ty);
        self.roads.recompute_shapes(&mut self.grid.tiles, orientation, None);

        info!(%orientation, "map rotated");
        CameraEvent::Rotated { orientation }
    }

    pub fn goto_tile(&mut self, tx: usize, ty: usize) -> CameraEvent {
        self.camera.goto_tile(&self.grid.bounds, tx as f64, ty as f64)
    }

    /// Tile under the centre of the view
    pub fn focused_tile(&self) -> Option<TileCoord> {
        let anchor = self.camera.focus.offset(-TILE_STEP_X, 0.0);
        let (tx, ty) = screen_to_tile(self.camera.orientation, &self.grid.bounds, anchor);
        let (tx, ty) = (tx.round(), ty.round());
        self.grid.tile(tx as i64, ty as i64).map(|t| t.coord)
    }

    pub fn add_roads(&mut self, coords: &[TileCoord]) -> usize {
        let orientation = self.orientation();
        let added = self.roads.add_roads(&mut self.grid.tiles, coords, orientation);
        if added > 0 {
            self.ground_dirty = true;
        }
        added
    }

    /// Mark or clear a tile that roads should connect towards, and reshape
    /// the roads around it.
    pub fn set_road_anchor(&mut self, coord: TileCoord, anchor: bool) {
        let Some(tile) = self.grid.tile_mut(coord.tx as i64, coord.ty as i64) else {
            return;
        };
        tile.road_anchor = anchor;

        let region = TileRect::from_coord(coord).grown(1, self.grid.width(), self.grid.height());
        let orientation = self.orientation();
        self.roads.recompute_shapes(&mut self.grid.tiles, orientation, Some(region));
        self.ground_dirty = true;
    }

    /// True once after any road edit, until read.
    pub fn take_ground_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ground_dirty)
    }

    pub fn assign_nature<R: Rng>(&mut self, rng: &mut R, density: f64, weights: &[Vec<u32>; 4]) -> usize {
        self.grid.assign_nature(rng, density, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roads::{l_route, RoadType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn planet(width: usize, height: usize) -> Planet {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        Planet::from_tiers(&Tilemap::new_with(width, height, LandType::Low), 0.5, &mut rng)
    }

    #[test]
    fn test_starts_centered() {
        let p = planet(10, 10);
        assert_eq!(p.focused_tile(), Some(TileCoord::new(5, 5)));
        assert_eq!(p.camera.scale, 0.5);
    }

    #[test]
    fn test_rotation_keeps_focused_tile() {
        let mut p = planet(12, 8);
        p.goto_tile(3, 6);
        for _ in 0..4 {
            let event = p.rotate_right();
            assert!(matches!(event, CameraEvent::Rotated { .. }));
            assert_eq!(p.focused_tile(), Some(TileCoord::new(3, 6)));
        }
        assert_eq!(p.orientation(), Orientation::R0);

        p.rotate_left();
        assert_eq!(p.orientation(), Orientation::R270);
        assert_eq!(p.focused_tile(), Some(TileCoord::new(3, 6)));
    }

    #[test]
    fn test_drag_previews_then_commits() {
        let mut p = planet(10, 10);
        let start = p.camera.focus;
        p.pan(ScreenPoint::new(10.0, 0.0));
        assert_eq!(p.camera.focus, start);
        assert_eq!(p.view().focus, ScreenPoint::new(start.x + 20.0, start.y));

        let event = p.commit_pan();
        assert_eq!(event, Some(CameraEvent::Moved { focus: ScreenPoint::new(start.x + 20.0, start.y) }));
        assert_eq!(p.commit_pan(), None);
    }

    #[test]
    fn test_rotation_reshapes_roads() {
        let mut p = planet(6, 6);
        p.add_roads(&l_route(TileCoord::new(1, 2), TileCoord::new(4, 2)));
        let shape = |p: &Planet| p.grid.tile(2, 2).and_then(|t| t.road).map(|r| r.road_type);
        assert_eq!(shape(&p), Some(RoadType::EW));
        p.rotate_right();
        assert_eq!(shape(&p), Some(RoadType::NS));
        p.rotate_right();
        assert_eq!(shape(&p), Some(RoadType::EW));
    }

    #[test]
    fn test_anchor_reshapes_neighbouring_road() {
        let mut p = planet(6, 6);
        p.add_roads(&l_route(TileCoord::new(1, 2), TileCoord::new(2, 2)));
        let shape = |p: &Planet| p.grid.tile(2, 2).and_then(|t| t.road).map(|r| r.road_type);
        assert_eq!(shape(&p), Some(RoadType::EndW));

        p.set_road_anchor(TileCoord::new(3, 2), true);
        assert_eq!(shape(&p), Some(RoadType::EW));
        p.set_road_anchor(TileCoord::new(3, 2), false);
        assert_eq!(shape(&p), Some(RoadType::EndW));
    }

    #[test]
    fn test_road_edits_mark_ground_dirty() {
        let mut p = planet(6, 6);
        assert!(!p.take_ground_dirty());

        p.add_roads(&[TileCoord::new(2, 2)]);
        assert!(p.take_ground_dirty());
        assert!(!p.take_ground_dirty());

        // nothing new to place
        p.add_roads(&[TileCoord::new(2, 2)]);
        assert!(!p.take_ground_dirty());

        p.set_road_anchor(TileCoord::new(3, 2), true);
        assert!(p.take_ground_dirty());
        p.set_road_anchor(TileCoord::new(9, 9), true);
        assert!(!p.take_ground_dirty());
    }

    #[test]
    fn test_zoom_events() {
        let mut p = planet(4, 4);
        assert!(p.zoom(false).is_some());
        assert!(p.zoom(false).is_none());
    }
}
