//! The tile grid and its per-tile state
//!
//! Tiers are fixed once the grid is built. Transitions come from one batch
//! classification pass and are never updated implicitly. Screen positions
//! are the only thing a rotation changes.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::{debug, info};

use crate::location::{tile_origin, MapBounds, Orientation, ScreenPoint};
use crate::roads::Road;
use crate::terrain::{classify_transitions, LandTransition, LandType, TransitionSummary};
use crate::tilemap::{TileCoord, Tilemap};

/// Procedural base sprites painted per tier
pub const BASE_VARIANTS: usize = 3;

/// One grid cell
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub coord: TileCoord,
    /// Top-left of the tile sprite in projected space, for the current rotation
    pub screen: ScreenPoint,
    tier: LandType,
    pub transition: LandTransition,
    /// Road sprites connect towards this tile even though it has no road
    pub road_anchor: bool,
    /// Index into the tier's decoration list; only on flat tiles
    pub nature: Option<usize>,
    pub road: Option<Road>,
    pub base_variant: usize,
}

impl Tile {
    pub fn new(coord: TileCoord, tier: LandType) -> Self {
        Self {
            coord,
            screen: ScreenPoint::default(),
            tier,
            transition: LandTransition::None,
            road_anchor: false,
            nature: None,
            road: None,
            base_variant: 0,
        }
    }

    pub fn tier(&self) -> LandType {
        self.tier
    }

    /// True when a neighbouring road should join up with this tile
    pub fn connects_road(&self) -> bool {
        self.road.is_some() || self.road_anchor
    }
}

pub struct MapGrid {
    pub tiles: Tilemap<Tile>,
    pub bounds: MapBounds,
    orientation: Orientation,
    paint_order: Vec<TileCoord>,
    summary: TransitionSummary,
}

impl MapGrid {
    /// Build the grid from a tier map, classify transitions and pick a base
    /// variant for every tile.
    pub fn new<R: Rng>(tiers: &Tilemap<LandType>, rng: &mut R) -> Self {
        let (transitions, summary) = classify_transitions(tiers);
        let tiles = Tilemap::from_fn(tiers.width, tiers.height, |x, y| {
            let mut tile = Tile::new(TileCoord::new(x, y), *tiers.get(x, y));
            tile.transition = *transitions.get(x, y);
            tile.base_variant = rng.gen_range(0..BASE_VARIANTS);
            tile
        });

        let mut grid = Self {
            bounds: MapBounds::new(tiers.width, tiers.height),
            paint_order: paint_order(tiers.width, tiers.height),
            tiles,
            orientation: Orientation::R0,
            summary,
        };
        grid.orientate(Orientation::R0);

        info!(width = grid.width(), height = grid.height(), "map grid created");
        grid
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn summary(&self) -> &TransitionSummary {
        &self.summary
    }

    /// Bounds-checked access; off-grid coordinates give `None`
    pub fn tile(&self, tx: i64, ty: i64) -> Option<&Tile> {
        self.tiles.try_get(tx, ty)
    }

    pub fn tile_mut(&mut self, tx: i64, ty: i64) -> Option<&mut Tile> {
        self.tiles.try_get_mut(tx, ty)
    }

    /// Back-to-front draw order
    pub fn paint_order(&self) -> &[TileCoord] {
        &self.paint_order
    }

    /// Recompute every tile's screen position for a rotation.
    pub fn orientate(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        let bounds = self.bounds;
        for (x, y, tile) in self.tiles.iter_mut() {
            tile.screen = tile_origin(orientation, &bounds, x, y);
        }
        debug!(%orientation, "tile screen positions updated");
    }

    /// Give some flat tiles a decoration. `weights[tier]` lists the pick
    /// weight of each decoration configured for that tier; `density` is the
    /// chance a candidate tile gets one. Returns the number placed.
    pub fn assign_nature<R: Rng>(&mut self, rng: &mut R, density: f64, weights: &[Vec<u32>; 4]) -> usize {
        let pickers: Vec<Option<WeightedIndex<u32>>> =
            weights.iter().map(|w| WeightedIndex::new(w.iter().copied()).ok()).collect();
        let density = density.clamp(0.0, 1.0);

        let mut placed = 0;
        for (_, _, tile) in self.tiles.iter_mut() {
            if !tile.transition.is_none() {
                continue;
            }
            let Some(picker) = pickers[tile.tier.index()].as_ref() else {
                continue;
            };
            if rng.gen_bool(density) {
                tile.nature = Some(picker.sample(rng));
                placed += 1;
            }
        }

        info!(placed, density, "assigned nature decorations");
        placed
    }
}

/// Row-major, each row walked from the high x end down to 0.
pub fn paint_order(width: usize, height: usize) -> Vec<TileCoord> {
    let mut order = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in (0..width).rev() {
            order.push(TileCoord::new(x, y));
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn island() -> Tilemap<LandType> {
        Tilemap::from_fn(5, 5, |x, y| {
            if (1..=3).contains(&x) && (1..=3).contains(&y) {
                LandType::Low
            } else {
                LandType::Water
            }
        })
    }

    #[test]
    fn test_paint_order() {
        let order = paint_order(3, 2);
        let expected: Vec<TileCoord> = [(2, 0), (1, 0), (0, 0), (2, 1), (1, 1), (0, 1)]
            .into_iter()
            .map(|(x, y)| TileCoord::new(x, y))
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_grid_classifies_and_places_tiles() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grid = MapGrid::new(&island(), &mut rng);
        assert_eq!(grid.tile(2, 0).map(|t| t.transition), Some(LandTransition::South));
        assert_eq!(grid.tile(2, 2).map(|t| t.transition), Some(LandTransition::None));
        assert_eq!(grid.tile(0, 0).map(|t| t.screen), Some(ScreenPoint::new(0.0, -16.0)));
        assert_eq!(grid.tile(2, 2).map(|t| t.tier()), Some(LandType::Low));
        assert_eq!(grid.tile(0, 4).map(|t| t.tier()), Some(LandType::Water));
        assert!(grid.tile(5, 0).is_none());
        assert!(grid.tile(-1, 2).is_none());
        assert!(grid.tiles.iter().all(|(_, _, t)| t.base_variant < BASE_VARIANTS));
    }

    #[test]
    fn test_orientate_moves_screen_positions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grid = MapGrid::new(&island(), &mut rng);
        let before = grid.tile(1, 3).map(|t| t.screen);
        grid.orientate(Orientation::R180);
        let after = grid.tile(1, 3).map(|t| t.screen);
        assert_ne!(before, after);
        assert_eq!(grid.orientation(), Orientation::R180);
        // transitions are not rotation dependent
        assert_eq!(grid.tile(2, 0).map(|t| t.transition), Some(LandTransition::South));
    }

    #[test]
    fn test_nature_only_on_flat_tiles() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut grid = MapGrid::new(&island(), &mut rng);
        let weights = [vec![1, 2], vec![5], vec![], vec![]];
        let placed = grid.assign_nature(&mut rng, 1.0, &weights);

        let flat = grid.tiles.iter().filter(|(_, _, t)| t.transition.is_none()).count();
        assert_eq!(placed, flat);
        for (_, _, tile) in grid.tiles.iter() {
            if tile.transition.is_none() {
                let n = tile.nature.unwrap();
                assert!(n < weights[tile.tier().index()].len());
            } else {
                assert_eq!(tile.nature, None);
            }
        }
    }

    #[test]
    fn test_nature_skips_tiers_without_decorations() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut grid = MapGrid::new(&island(), &mut rng);
        let weights = [vec![], vec![], vec![], vec![]];
        assert_eq!(grid.assign_nature(&mut rng, 1.0, &weights), 0);
    }
}
