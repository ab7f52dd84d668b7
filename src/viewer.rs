use std::path::PathBuf;

use image::RgbaImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::{debug, info};

use crate::assets::AssetTable;
use crate::camera::CameraEvent;
use crate::config::ViewSettings;
use crate::error::ViewerError;
use crate::location::ScreenPoint;
use crate::planet::Planet;
use crate::render::{MapRenderer, TickStats};

/// A loaded map with everything needed to draw it
pub struct MapSession {
    pub planet: Planet,
    pub assets: AssetTable,
    pub renderer: MapRenderer,
    pub settings: ViewSettings,
}

impl MapSession {
    pub fn new(planet: Planet, assets: AssetTable, settings: ViewSettings) -> Self {
        let renderer = MapRenderer::new(settings.canvas_width, settings.canvas_height, settings.settle_ticks);
        Self {
            planet,
            assets,
            renderer,
            settings,
        }
    }

    /// React to a camera change. Zoom and rotation force a ground repaint.
    pub fn apply(&mut self, event: Option<CameraEvent>) {
        let Some(event) = event else {
            return;
        };
        debug!(?event, "camera event");
        match event {
            CameraEvent::Zoomed { .. } | CameraEvent::Rotated { .. } => self.renderer.invalidate(),
            CameraEvent::Moved { .. } => {}
        }
    }

    /// One fixed-period redraw of the current view, drag preview included.
    pub fn tick(&mut self) -> Option<TickStats> {
        if self.planet.take_ground_dirty() {
            self.renderer.invalidate();
        }
        let view = self.planet.view();
        self.renderer.tick(&self.planet.grid, &view, &self.assets)
    }

    /// Run `count` ticks back to back. Returns how many actually drew.
    pub fn run_ticks(&mut self, count: u32) -> usize {
        (0..count).filter_map(|_| self.tick()).count()
    }

    /// Write `<prefix>_ground.png`, `<prefix>_air.png` and `<prefix>_frame.png`.
    pub fn save_layers(&self, prefix: &str) -> Result<Vec<PathBuf>, ViewerError> {
        let layers = [
            ("ground", self.renderer.ground().clone()),
            ("air", self.renderer.air().clone()),
            ("frame", self.renderer.frame()),
        ];

        let mut written = Vec::with_capacity(layers.len());
        for (name, image) in layers {
            let path = PathBuf::from(format!("{prefix}_{name}.png"));
            image
                .save(&path)
                .map_err(|source| ViewerError::Save { path: path.clone(), source })?;
            info!(path = %path.display(), "layer written");
            written.push(path);
        }
        Ok(written)
    }
}

/// What the left mouse button did since the last poll
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragUpdate {
    Idle,
    /// Total drag so far as click point minus current point
    Preview(ScreenPoint),
    Release,
}

/// Tracks a left-button drag between polls
#[derive(Clone, Copy, Debug, Default)]
pub struct DragState {
    start: Option<(f32, f32)>,
}

impl DragState {
    pub fn update(&mut self, down: bool, pos: Option<(f32, f32)>) -> DragUpdate {
        match (down, self.start, pos) {
            (true, None, _) => {
                self.start = pos;
                DragUpdate::Idle
            }
            (true, Some((sx, sy)), Some((mx, my))) => DragUpdate::Preview(ScreenPoint::new((sx - mx) as f64, (sy - my) as f64)),
            (true, Some(_), None) => DragUpdate::Idle,
            (false, Some(_), _) => {
                self.start = None;
                DragUpdate::Release
            }
            (false, None, _) => DragUpdate::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }
}

/// Convert an RGBA frame into minifb's 0RGB buffer. Alpha is dropped.
pub fn frame_to_buffer(frame: &RgbaImage, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.extend(frame.pixels().map(|p| {
        let [r, g, b, _] = p.0;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }));
}

fn pressed(window: &Window, keys: &[Key]) -> bool {
    keys.iter().any(|&k| window.is_key_pressed(k, KeyRepeat::No))
}

/// Open a window and run the fixed-tick loop until it is closed.
/// Drag to pan, +/- to zoom, Q/E to rotate, P to pause, Escape to exit.
pub fn run_viewer(mut session: MapSession) -> Result<(), ViewerError> {
    let (width, height) = session.renderer.canvas_size();
    let (width, height) = (width as usize, height as usize);

    let mut window = Window::new(
        "Planet Map - drag: pan, +/-: zoom, Q/E: rotate, P: pause, Esc: exit",
        width,
        height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )?;

    let fps = (1000 / session.settings.tick_ms.max(1)).max(1) as usize;
    window.set_target_fps(fps);
    info!(width, height, fps, "viewer started");

    let mut buffer = vec![0u32; width * height];
    let mut drag = DragState::default();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if pressed(&window, &[Key::Equal, Key::NumPadPlus]) {
            let event = session.planet.zoom(true);
            session.apply(event);
        }
        if pressed(&window, &[Key::Minus, Key::NumPadMinus]) {
            let event = session.planet.zoom(false);
            session.apply(event);
        }
        if pressed(&window, &[Key::Q]) {
            let event = session.planet.rotate_left();
            session.apply(Some(event));
        }
        if pressed(&window, &[Key::E]) {
            let event = session.planet.rotate_right();
            session.apply(Some(event));
        }
        if pressed(&window, &[Key::P]) {
            session.renderer.paused = !session.renderer.paused;
            info!(paused = session.renderer.paused, "pause toggled");
        }

        let down = window.get_mouse_down(MouseButton::Left);
        match drag.update(down, window.get_mouse_pos(MouseMode::Clamp)) {
            DragUpdate::Preview(delta) => session.planet.pan(delta),
            DragUpdate::Release => {
                let event = session.planet.commit_pan();
                session.apply(event);
            }
            DragUpdate::Idle => {}
        }

        if session.tick().is_some() {
            frame_to_buffer(&session.renderer.frame(), &mut buffer);
        }
        window.update_with_buffer(&buffer, width, height)?;
    }

    info!(ticks = session.renderer.ticks(), "viewer closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::LandType;
    use crate::tilemap::{TileCoord, Tilemap};
    use image::Rgba;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn session() -> MapSession {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let planet = Planet::from_tiers(&Tilemap::new_with(6, 6, LandType::Medium), 1.0, &mut rng);
        let settings = ViewSettings {
            canvas_width: 64,
            canvas_height: 48,
            settle_ticks: 0,
            ..ViewSettings::default()
        };
        MapSession::new(planet, AssetTable::new(), settings)
    }

    #[test]
    fn test_drag_sequence() {
        let mut drag = DragState::default();
        assert_eq!(drag.update(false, Some((5.0, 5.0))), DragUpdate::Idle);
        assert_eq!(drag.update(true, Some((10.0, 10.0))), DragUpdate::Idle);
        assert!(drag.is_dragging());
        assert_eq!(drag.update(true, Some((4.0, 13.0))), DragUpdate::Preview(ScreenPoint::new(6.0, -3.0)));
        assert_eq!(drag.update(false, Some((4.0, 13.0))), DragUpdate::Release);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_buffer_is_0rgb() {
        let frame = RgbaImage::from_pixel(2, 1, Rgba([0x12, 0x34, 0x56, 0x00]));
        let mut buffer = Vec::new();
        frame_to_buffer(&frame, &mut buffer);
        assert_eq!(buffer, vec![0x123456, 0x123456]);
    }

    #[test]
    fn test_zoom_forces_ground_redraw() {
        let mut s = session();
        assert!(s.tick().is_some_and(|t| t.ground_redrawn));
        assert!(s.tick().is_some_and(|t| !t.ground_redrawn));

        let event = s.planet.zoom(true);
        s.apply(event);
        assert!(s.tick().is_some_and(|t| t.ground_redrawn));
    }

    #[test]
    fn test_road_edit_forces_ground_redraw() {
        let mut s = session();
        s.tick();
        assert!(s.tick().is_some_and(|t| !t.ground_redrawn));

        s.planet.add_roads(&[TileCoord::new(2, 2), TileCoord::new(3, 2)]);
        assert!(s.tick().is_some_and(|t| t.ground_redrawn));
        assert!(s.tick().is_some_and(|t| !t.ground_redrawn));

        s.planet.set_road_anchor(TileCoord::new(4, 2), true);
        assert!(s.tick().is_some_and(|t| t.ground_redrawn));
    }

    #[test]
    fn test_paused_ticks_draw_nothing() {
        let mut s = session();
        s.renderer.paused = true;
        assert_eq!(s.run_ticks(5), 0);
        assert_eq!(s.renderer.ticks(), 5);
        s.renderer.paused = false;
        assert_eq!(s.run_ticks(2), 2);
    }

    #[test]
    fn test_save_layers() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        s.tick();
        let prefix = dir.path().join("view");
        let written = s.save_layers(&prefix.to_string_lossy()).unwrap();
        assert_eq!(written.len(), 3);
        for path in written {
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (64, 48));
        }
    }
}
