//! Road network: placement and shape classification
//!
//! A road occupies exactly one tile. Its sprite shape depends on which of its
//! eight neighbours also carry a road (or are marked as road anchors) and on
//! the camera rotation. The neighbour mask indexes a 256-entry table whose
//! four columns hold the shape as seen from each rotation.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::location::Orientation;
use crate::map::Tile;
use crate::neighbors::{mask_of, Neighbor, NeighborSet, CARDINALS, DIAGONALS};
use crate::tilemap::{TileCoord, Tilemap};

/// Sprite shape of a road tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RoadType {
    /// Disconnected stub
    #[default]
    None,
    EndN,
    EndE,
    EndS,
    EndW,
    NS,
    EW,
    /// Edge pieces; only drawn from dedicated sprites, never classified
    N,
    S,
    E,
    W,
    CornerNE,
    CornerSE,
    CornerSW,
    CornerNW,
    /// Three-way junctions, named after the branch opposite the missing one
    TN,
    TE,
    TS,
    TW,
    Cross,
}

impl RoadType {
    pub const COUNT: usize = 20;

    pub const ALL: [RoadType; Self::COUNT] = [
        RoadType::None,
        RoadType::EndN,
        RoadType::EndE,
        RoadType::EndS,
        RoadType::EndW,
        RoadType::NS,
        RoadType::EW,
        RoadType::N,
        RoadType::S,
        RoadType::E,
        RoadType::W,
        RoadType::CornerNE,
        RoadType::CornerSE,
        RoadType::CornerSW,
        RoadType::CornerNW,
        RoadType::TN,
        RoadType::TE,
        RoadType::TS,
        RoadType::TW,
        RoadType::Cross,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The same shape turned clockwise by `quarter_turns` (N -> E -> S -> W).
    pub fn rotated(&self, quarter_turns: usize) -> RoadType {
        use RoadType::*;
        const ENDS: [RoadType; 4] = [EndN, EndE, EndS, EndW];
        const EDGES: [RoadType; 4] = [N, E, S, W];
        const CORNERS: [RoadType; 4] = [CornerNE, CornerSE, CornerSW, CornerNW];
        const TEES: [RoadType; 4] = [TN, TE, TS, TW];

        let turn = |ring: &[RoadType; 4]| -> Option<RoadType> {
            ring.iter()
                .position(|r| r == self)
                .map(|i| ring[(i + quarter_turns) % 4])
        };

        match self {
            None | Cross => *self,
            NS | EW => {
                if quarter_turns % 2 == 0 {
                    *self
                } else if *self == NS {
                    EW
                } else {
                    NS
                }
            }
            _ => turn(&ENDS)
                .or_else(|| turn(&EDGES))
                .or_else(|| turn(&CORNERS))
                .or_else(|| turn(&TEES))
                .unwrap_or(*self),
        }
    }
}

/// Stable index of a road in the sparse road table
pub type RoadId = usize;

/// A road segment on one tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Road {
    pub road_type: RoadType,
    pub tile: TileCoord,
    pub id: RoadId,
}

impl Road {
    /// Row-major id. Unique on any grid shape.
    pub fn id_for(tile: TileCoord, grid_width: usize) -> RoadId {
        tile.tx + tile.ty * grid_width
    }
}

/// Neighbour mask -> shape per orientation
pub struct RoadLookup {
    table: [Option<[RoadType; 4]>; 256],
}

impl Default for RoadLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl RoadLookup {
    pub fn new() -> Self {
        use Neighbor as Nb;
        let mut lookup = Self { table: [None; 256] };

        // dead ends: a cardinal alone, optionally hinted by its flanking diagonals
        let ends = [
            (Nb::N, RoadType::EndN, [Nb::NW, Nb::NE]),
            (Nb::E, RoadType::EndE, [Nb::NE, Nb::SE]),
            (Nb::S, RoadType::EndS, [Nb::SE, Nb::SW]),
            (Nb::W, RoadType::EndW, [Nb::SW, Nb::NW]),
        ];
        for (cardinal, shape, [a, b]) in ends {
            lookup.insert(mask_of(&[cardinal]), shape);
            lookup.insert(mask_of(&[cardinal, a]), shape);
            lookup.insert(mask_of(&[cardinal, b]), shape);
            lookup.insert(mask_of(&[cardinal, a, b]), shape);
        }

        lookup.insert(mask_of(&[Nb::N, Nb::S]), RoadType::NS);
        lookup.insert(mask_of(&[Nb::E, Nb::W]), RoadType::EW);

        lookup.insert(mask_of(&[Nb::N, Nb::E]), RoadType::CornerNE);
        lookup.insert(mask_of(&[Nb::S, Nb::E]), RoadType::CornerSE);
        lookup.insert(mask_of(&[Nb::S, Nb::W]), RoadType::CornerSW);
        lookup.insert(mask_of(&[Nb::N, Nb::W]), RoadType::CornerNW);

        lookup.insert(mask_of(&[Nb::N, Nb::E, Nb::W]), RoadType::TN);
        lookup.insert(mask_of(&[Nb::N, Nb::E, Nb::S]), RoadType::TE);
        lookup.insert(mask_of(&[Nb::E, Nb::S, Nb::W]), RoadType::TS);
        lookup.insert(mask_of(&[Nb::N, Nb::S, Nb::W]), RoadType::TW);

        lookup.insert(mask_of(&CARDINALS), RoadType::Cross);

        lookup
    }

    fn insert(&mut self, mask: u8, shape: RoadType) {
        self.table[mask as usize] = Some([shape, shape.rotated(1), shape.rotated(2), shape.rotated(3)]);
    }

    /// Exact table hit for a mask, if any
    pub fn get(&self, mask: u8, orientation: Orientation) -> Option<RoadType> {
        self.table[mask as usize].map(|column| column[orientation.index()])
    }

    /// Full classification: exact hit, then a retry with every diagonal that
    /// sits next to a present cardinal pruned, then the stub shape.
    pub fn classify(&self, neighbors: NeighborSet, orientation: Orientation) -> RoadType {
        if let Some(shape) = self.get(neighbors.mask(), orientation) {
            return shape;
        }

        let mut pruned = neighbors;
        for diagonal in DIAGONALS {
            if let Some((a, b)) = diagonal.flanking_cardinals() {
                if neighbors.has(a) || neighbors.has(b) {
                    pruned.remove(diagonal);
                }
            }
        }

        self.get(pruned.mask(), orientation).unwrap_or(RoadType::None)
    }

    /// Number of populated masks
    pub fn len(&self) -> usize {
        self.table.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive tile rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileRect {
    pub fn from_coord(c: TileCoord) -> Self {
        Self { min: c, max: c }
    }

    pub fn include(&mut self, c: TileCoord) {
        self.min.tx = self.min.tx.min(c.tx);
        self.min.ty = self.min.ty.min(c.ty);
        self.max.tx = self.max.tx.max(c.tx);
        self.max.ty = self.max.ty.max(c.ty);
    }

    /// Grow by `n` tiles on every side, clipped to a `width` x `height` grid
    pub fn grown(&self, n: usize, width: usize, height: usize) -> Self {
        Self {
            min: TileCoord::new(self.min.tx.saturating_sub(n), self.min.ty.saturating_sub(n)),
            max: TileCoord::new(
                (self.max.tx + n).min(width.saturating_sub(1)),
                (self.max.ty + n).min(height.saturating_sub(1)),
            ),
        }
    }

    pub fn contains(&self, c: TileCoord) -> bool {
        (self.min.tx..=self.max.tx).contains(&c.tx) && (self.min.ty..=self.max.ty).contains(&c.ty)
    }
}

/// All roads on the map, treated as one route
#[derive(Default)]
pub struct RoadNetwork {
    lookup: RoadLookup,
    /// Sparse id -> tile table
    table: BTreeMap<RoadId, TileCoord>,
    /// Bounding box of every road placed so far
    bounds: Option<TileRect>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn bounds(&self) -> Option<TileRect> {
        self.bounds
    }

    /// Place roads on every listed tile that does not already have one,
    /// then reshape the area they touch. Returns how many roads were added.
    pub fn add_roads(&mut self, tiles: &mut Tilemap<Tile>, coords: &[TileCoord], orientation: Orientation) -> usize {
        let width = tiles.width;
        let mut touched: Option<TileRect> = None;
        let mut added = 0;

        for &coord in coords {
            let Some(tile) = tiles.try_get_mut(coord.tx as i64, coord.ty as i64) else {
                debug!(tile = %coord, "skipping road outside the grid");
                continue;
            };
            if tile.road.is_some() {
                continue;
            }

            let id = Road::id_for(coord, width);
            tile.road = Some(Road {
                road_type: RoadType::None,
                tile: coord,
                id,
            });
            self.table.insert(id, coord);
            added += 1;

            match touched.as_mut() {
                Some(rect) => rect.include(coord),
                None => touched = Some(TileRect::from_coord(coord)),
            }
        }

        let Some(rect) = touched else {
            return 0;
        };

        match self.bounds.as_mut() {
            Some(b) => {
                b.include(rect.min);
                b.include(rect.max);
            }
            None => self.bounds = Some(rect),
        }

        let region = rect.grown(1, tiles.width, tiles.height);
        self.recompute_shapes(tiles, orientation, Some(region));

        info!(added, total = self.table.len(), "added roads in {}..{}", rect.min, rect.max);
        added
    }

    /// Reclassify road shapes. `None` reshapes every road, which is what a
    /// camera rotation needs since every column changes.
    pub fn recompute_shapes(&self, tiles: &mut Tilemap<Tile>, orientation: Orientation, region: Option<TileRect>) {
        let shapes: Vec<(TileCoord, RoadType)> = self
            .table
            .values()
            .filter(|c| region.map_or(true, |r| r.contains(**c)))
            .map(|&c| {
                let neighbors = tiles.neighbor_set(c.tx, c.ty, |t| t.connects_road());
                (c, self.lookup.classify(neighbors, orientation))
            })
            .collect();

        for (c, shape) in shapes {
            if let Some(road) = tiles.get_mut(c.tx, c.ty).road.as_mut() {
                road.road_type = shape;
            }
        }
    }
}

/// An L-shaped path: along x first, then along y. Both ends included.
pub fn l_route(from: TileCoord, to: TileCoord) -> Vec<TileCoord> {
    let mut route = Vec::new();
    let step = |a: usize, b: usize| -> Box<dyn Iterator<Item = usize>> {
        if a <= b {
            Box::new(a..=b)
        } else {
            Box::new((b..=a).rev())
        }
    };

    for x in step(from.tx, to.tx) {
        route.push(TileCoord::new(x, from.ty));
    }
    for y in step(from.ty, to.ty).skip(1) {
        route.push(TileCoord::new(to.tx, y));
    }
    route
}
