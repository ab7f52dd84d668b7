//! 8-neighbour adjacency masks
//!
//! Both the land transition pass and the road classifier ask the same
//! question of a tile: which of its eight neighbours satisfy some predicate?
//! The answer is packed into one byte so it can index lookup tables directly.

use crate::tilemap::{TileCoord, Tilemap};

/// Compass position of a neighbour, valued as its bit in the mask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Neighbor {
    NW = 1 << 0,
    N = 1 << 1,
    NE = 1 << 2,
    W = 1 << 3,
    E = 1 << 4,
    SW = 1 << 5,
    S = 1 << 6,
    SE = 1 << 7,
}

/// Scan order. Also the bit order: `SCAN_ORDER[i]` is bit `1 << i`.
pub const SCAN_ORDER: [Neighbor; 8] = [
    Neighbor::NW,
    Neighbor::N,
    Neighbor::NE,
    Neighbor::W,
    Neighbor::E,
    Neighbor::SW,
    Neighbor::S,
    Neighbor::SE,
];

/// Cardinal neighbours in N, E, S, W order
pub const CARDINALS: [Neighbor; 4] = [Neighbor::N, Neighbor::E, Neighbor::S, Neighbor::W];

/// Diagonal neighbours in NE, SE, SW, NW order
pub const DIAGONALS: [Neighbor; 4] = [Neighbor::NE, Neighbor::SE, Neighbor::SW, Neighbor::NW];

impl Neighbor {
    pub fn bit(&self) -> u8 {
        *self as u8
    }

    /// Grid offset (dx, dy); north is -y
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Neighbor::NW => (-1, -1),
            Neighbor::N => (0, -1),
            Neighbor::NE => (1, -1),
            Neighbor::W => (-1, 0),
            Neighbor::E => (1, 0),
            Neighbor::SW => (-1, 1),
            Neighbor::S => (0, 1),
            Neighbor::SE => (1, 1),
        }
    }

    fn slot(&self) -> usize {
        self.bit().trailing_zeros() as usize
    }

    /// The two cardinals on either side of a diagonal, `None` for cardinals
    pub fn flanking_cardinals(&self) -> Option<(Neighbor, Neighbor)> {
        match self {
            Neighbor::NE => Some((Neighbor::N, Neighbor::E)),
            Neighbor::SE => Some((Neighbor::S, Neighbor::E)),
            Neighbor::SW => Some((Neighbor::S, Neighbor::W)),
            Neighbor::NW => Some((Neighbor::N, Neighbor::W)),
            _ => None,
        }
    }

    /// Rotate a compass position by quarter turns clockwise (N -> E -> S -> W)
    pub fn rotated(&self, quarter_turns: usize) -> Neighbor {
        const RING: [Neighbor; 8] = [
            Neighbor::N,
            Neighbor::NE,
            Neighbor::E,
            Neighbor::SE,
            Neighbor::S,
            Neighbor::SW,
            Neighbor::W,
            Neighbor::NW,
        ];
        let pos = RING.iter().position(|n| n == self).unwrap_or(0);
        RING[(pos + 2 * quarter_turns) % 8]
    }
}

/// Sum of bits for a set of neighbours
pub fn mask_of(neighbors: &[Neighbor]) -> u8 {
    neighbors.iter().fold(0u8, |acc, n| acc | n.bit())
}

/// Result of an 8-neighbour scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NeighborSet {
    mask: u8,
    /// In-bounds neighbours, indexed by scan slot
    tiles: [Option<TileCoord>; 8],
}

impl NeighborSet {
    pub fn from_mask(mask: u8) -> Self {
        Self { mask, tiles: [None; 8] }
    }

    /// Bits of the neighbours that matched
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// True when every bit of `mask` matched
    pub fn has_all(&self, mask: u8) -> bool {
        self.mask & mask == mask
    }

    /// True when any of the listed positions matched
    pub fn has_any(&self, positions: &[Neighbor]) -> bool {
        self.mask & mask_of(positions) != 0
    }

    pub fn has(&self, position: Neighbor) -> bool {
        self.mask & position.bit() != 0
    }

    /// Clear one position after the scan
    pub fn remove(&mut self, position: Neighbor) {
        self.mask &= !position.bit();
    }

    /// Coordinate of the neighbour at `position`, if it is on the grid
    pub fn get(&self, position: Neighbor) -> Option<TileCoord> {
        self.tiles[position.slot()]
    }
}

impl<T> Tilemap<T> {
    /// Scan the 8 cells around (x, y) and record which satisfy `predicate`.
    /// Cells off the grid never match.
    pub fn neighbor_set(&self, x: usize, y: usize, predicate: impl Fn(&T) -> bool) -> NeighborSet {
        let mut set = NeighborSet::default();
        for (slot, position) in SCAN_ORDER.iter().enumerate() {
            let (dx, dy) = position.offset();
            let Some(coord) = TileCoord::new(x, y).offset(dx, dy) else {
                continue;
            };
            if let Some(cell) = self.try_get(coord.tx as i64, coord.ty as i64) {
                set.tiles[slot] = Some(coord);
                if predicate(cell) {
                    set.mask |= position.bit();
                }
            }
        }
        set
    }
}
