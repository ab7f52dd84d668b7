//! Isometric projection math
//!
//! Tiles live on a square grid. On screen they are 64x32 diamonds laid out in
//! a 2:1 isometric projection which can be viewed from four fixed rotations.
//! Everything here is closed form: the projection, its inverse, and the
//! perpendicular-foot solutions against the four edges of the map diamond
//! which both camera clamping and the blend masks rely on.

use serde::{Deserialize, Serialize};

/// Width of one tile step along either grid axis, in screen pixels
pub const TILE_STEP_X: f64 = 32.0;
/// Half the screen height of a tile diamond
pub const TILE_STEP_Y: f64 = 16.0;
/// Sprite footprint of a single tile
pub const TILE_WIDTH: u32 = 64;
pub const TILE_HEIGHT: u32 = 32;

/// One of the four fixed camera rotations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Orientation {
    pub fn all() -> [Orientation; 4] {
        [Orientation::R0, Orientation::R90, Orientation::R180, Orientation::R270]
    }

    /// Number of clockwise quarter turns from the default view
    pub fn index(&self) -> usize {
        match self {
            Orientation::R0 => 0,
            Orientation::R90 => 1,
            Orientation::R180 => 2,
            Orientation::R270 => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Orientation::R0,
            1 => Orientation::R90,
            2 => Orientation::R180,
            _ => Orientation::R270,
        }
    }

    pub fn rotated_right(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn rotated_left(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn degrees(&self) -> u32 {
        self.index() as u32 * 90
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Edges of the map diamond, in the order used for every tie-break
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn all() -> [Direction; 4] {
        [Direction::North, Direction::East, Direction::South, Direction::West]
    }

    pub fn index(&self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }
}

/// A point in projected (screen-space, unscaled) coordinates
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m({:.1},{:.1})", self.x, self.y)
    }
}

/// Rounds halves toward positive infinity (-2.5 -> -2, 2.5 -> 3).
///
/// The blend masks were tuned against this rounding rule; `f64::round`
/// rounds halves away from zero and shifts negative edges by one pixel.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Pixel extent of the map, fixed once the grid size is known
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBounds {
    pub tiles_wide: usize,
    pub tiles_high: usize,
    /// 32 * grid width
    pub mw: f64,
    /// 32 * grid height
    pub mh: f64,
}

impl MapBounds {
    pub fn new(tiles_wide: usize, tiles_high: usize) -> Self {
        Self {
            tiles_wide,
            tiles_high,
            mw: TILE_STEP_X * tiles_wide as f64,
            mh: TILE_STEP_X * tiles_high as f64,
        }
    }

    /// The four vertices of the map diamond at the default rotation
    pub fn corner(&self, a: Direction, b: Direction) -> Option<ScreenPoint> {
        use Direction::*;
        match (a, b) {
            (North, West) | (West, North) => Some(ScreenPoint::new(0.0, 0.0)),
            (North, East) | (East, North) => Some(ScreenPoint::new(self.mw, -0.5 * self.mh)),
            (South, West) | (West, South) => Some(ScreenPoint::new(self.mw, 0.5 * self.mh)),
            (East, South) | (South, East) => Some(ScreenPoint::new(2.0 * self.mw, 0.0)),
            _ => None,
        }
    }
}

// =============================================================================
// PROJECTION
// =============================================================================

/// Affine coefficients of the tile -> screen map for one rotation:
/// `x = ax*tx + bx*ty + cx`, `y = ay*tx + by*ty + cy`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Affine {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl Affine {
    fn for_orientation(orientation: Orientation, bounds: &MapBounds) -> Self {
        let (mw, mh) = (bounds.mw, bounds.mh);
        match orientation {
            Orientation::R0 => Affine { ax: 32.0, bx: 32.0, cx: 0.0, ay: -16.0, by: 16.0, cy: 0.0 },
            Orientation::R90 => Affine {
                ax: 32.0,
                bx: -32.0,
                cx: mw - 32.0,
                ay: 16.0,
                by: 16.0,
                cy: -mh / 2.0 + 16.0,
            },
            Orientation::R180 => Affine {
                ax: -32.0,
                bx: -32.0,
                cx: mw * 2.0 - 64.0,
                ay: 16.0,
                by: -16.0,
                cy: 0.0,
            },
            Orientation::R270 => Affine {
                ax: -32.0,
                bx: 32.0,
                cx: mw - 32.0,
                ay: -16.0,
                by: -16.0,
                cy: mh * 0.5 - 16.0,
            },
        }
    }
}

/// Project grid coordinates to screen coordinates for a given rotation.
pub fn tile_to_screen(orientation: Orientation, bounds: &MapBounds, tx: f64, ty: f64) -> ScreenPoint {
    let a = Affine::for_orientation(orientation, bounds);
    ScreenPoint::new(a.ax * tx + a.bx * ty + a.cx, a.ay * tx + a.by * ty + a.cy)
}

/// Invert [`tile_to_screen`]. Returns fractional grid coordinates.
pub fn screen_to_tile(orientation: Orientation, bounds: &MapBounds, point: ScreenPoint) -> (f64, f64) {
    let a = Affine::for_orientation(orientation, bounds);
    let u = point.x - a.cx;
    let v = point.y - a.cy;
    let det = a.ax * a.by - a.bx * a.ay;
    let tx = (u * a.by - a.bx * v) / det;
    let ty = (a.ax * v - a.ay * u) / det;
    (tx, ty)
}

/// Top-left corner of a tile's 64x32 sprite.
pub fn tile_origin(orientation: Orientation, bounds: &MapBounds, tx: usize, ty: usize) -> ScreenPoint {
    tile_to_screen(orientation, bounds, tx as f64, ty as f64).offset(0.0, -TILE_STEP_Y)
}

/// Center of a tile's diamond; this is where the camera looks when it goes to a tile.
pub fn tile_focus(orientation: Orientation, bounds: &MapBounds, tx: f64, ty: f64) -> ScreenPoint {
    tile_to_screen(orientation, bounds, tx, ty).offset(TILE_STEP_X, 0.0)
}

// =============================================================================
// BOUNDARY MATH
// =============================================================================

/// Project `point` onto one edge of a diamond whose west vertex sits at the
/// origin and whose extents are `box_w` x `box_h`. The projection runs along
/// the other grid axis, i.e. it is perpendicular in tile space, not on screen.
///
/// Edges, with w/h the box extents:
/// - North: `y = -x/2`
/// - East:  `y = x/2 - w/2 - h/2`
/// - South: `y = -(x - w)/2 + h/2`
/// - West:  `y = x/2`
pub fn boundary_intersection(direction: Direction, point: ScreenPoint, box_w: f64, box_h: f64) -> ScreenPoint {
    let (mx, my) = (point.x, point.y);
    match direction {
        Direction::North => ScreenPoint::new(0.5 * mx - my, (-0.5 * mx + my) * 0.5),
        Direction::East => ScreenPoint::new(
            0.5 * mx + my + 0.5 * box_w + 0.5 * box_h,
            (mx + 2.0 * my - box_w - box_h) * 0.25,
        ),
        Direction::South => ScreenPoint::new(
            (mx - 2.0 * my + box_w + box_h) * 0.5,
            -(mx - 2.0 * my - box_w - box_h) * 0.25,
        ),
        Direction::West => ScreenPoint::new(0.5 * mx + my, 0.25 * mx + 0.5 * my),
    }
}

/// True when `point` lies outside the map on the far side of `direction`'s edge.
fn has_exited(direction: Direction, point: ScreenPoint, bound: ScreenPoint) -> bool {
    match direction {
        Direction::North => point.x < bound.x && point.y < bound.y,
        Direction::East => point.x > bound.x && point.y < bound.y,
        Direction::South => point.x > bound.x && point.y > bound.y,
        Direction::West => point.x < bound.x && point.y > bound.y,
    }
}

/// Apply a drag delta (screen pixels) to the camera focus and keep the
/// result inside the map diamond.
///
/// Only the default rotation is clamped. Edges are tested in N, E, S, W
/// order: a single exit snaps onto that edge; when two or more edges are
/// crossed the first two detected pick a map vertex, and a pair that names
/// no vertex falls back to the last detected edge.
pub fn clamp_pan_delta(
    orientation: Orientation,
    bounds: &MapBounds,
    current: ScreenPoint,
    delta: ScreenPoint,
    scale: f64,
) -> ScreenPoint {
    let location = ScreenPoint::new(current.x + delta.x / scale, current.y + delta.y / scale);

    if orientation != Orientation::R0 {
        return location;
    }

    let mut exits: Vec<Direction> = Vec::with_capacity(4);
    let mut exit_bound: Option<ScreenPoint> = None;

    for direction in Direction::all() {
        let bound = boundary_intersection(direction, location, bounds.mw, bounds.mh);
        if has_exited(direction, location, bound) {
            exits.push(direction);
            exit_bound = Some(bound);
        }
    }

    if exits.len() > 1 {
        use Direction::*;
        let corner = match (exits[0], exits[1]) {
            (North, West) | (North, East) | (South, West) | (East, South) => bounds.corner(exits[0], exits[1]),
            _ => None,
        };
        if let Some(corner) = corner {
            return corner;
        }
    }

    exit_bound.unwrap_or(location)
}
