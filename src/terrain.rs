//! Elevation tiers and land transitions
//!
//! Each tile carries one of four elevation tiers. Where a higher tier touches
//! a lower one the lower tile is drawn with a blended sprite; which blend it
//! gets is decided once, for the whole grid, by [`classify_transitions`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::location::Orientation;
use crate::neighbors::{Neighbor, CARDINALS, DIAGONALS};
use crate::tilemap::Tilemap;

/// Discrete elevation, strictly increasing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandType {
    #[default]
    Water,
    Low,
    Medium,
    High,
}

impl LandType {
    pub fn all() -> [LandType; 4] {
        [LandType::Water, LandType::Low, LandType::Medium, LandType::High]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The next tier up, if any
    pub fn upper(&self) -> Option<LandType> {
        match self {
            LandType::Water => Some(LandType::Low),
            LandType::Low => Some(LandType::Medium),
            LandType::Medium => Some(LandType::High),
            LandType::High => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LandType::Water => "water",
            LandType::Low => "low",
            LandType::Medium => "medium",
            LandType::High => "high",
        }
    }
}

/// Edge/corner category of a tile that borders higher ground.
///
/// Codes 0-3: one edge touches higher ground.
/// Codes 4-7: two edges touch, or (from the diagonal pass) never produced.
/// Codes 8-11: only one diagonal touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LandTransition {
    #[default]
    None,
    North,
    East,
    South,
    West,
    NeUp,
    SeUp,
    SwUp,
    NwUp,
    NeDown,
    SeDown,
    SwDown,
    NwDown,
}

impl LandTransition {
    /// Every blended transition, in code order
    pub const BLENDED: [LandTransition; 12] = [
        LandTransition::North,
        LandTransition::East,
        LandTransition::South,
        LandTransition::West,
        LandTransition::NeUp,
        LandTransition::SeUp,
        LandTransition::SwUp,
        LandTransition::NwUp,
        LandTransition::NeDown,
        LandTransition::SeDown,
        LandTransition::SwDown,
        LandTransition::NwDown,
    ];

    /// Numeric code, -1 for `None`
    pub fn code(&self) -> i8 {
        match self {
            LandTransition::None => -1,
            other => Self::BLENDED.iter().position(|t| t == other).map(|i| i as i8).unwrap_or(-1),
        }
    }

    pub fn from_code(code: i8) -> Self {
        if (0..12).contains(&code) {
            Self::BLENDED[code as usize]
        } else {
            LandTransition::None
        }
    }

    pub fn is_none(&self) -> bool {
        *self == LandTransition::None
    }

    /// Codes 0-3 blend along a straight edge; everything else is a corner
    pub fn is_edge(&self) -> bool {
        (0..=3).contains(&self.code())
    }

    /// The transition as seen from a rotated camera. The sprite for a
    /// north edge viewed at 90° is the east edge sprite, and so on within
    /// each group of four.
    pub fn oriented(&self, orientation: Orientation) -> Self {
        let code = self.code();
        if code < 0 {
            return *self;
        }
        let group = code / 4;
        let rotated = (code % 4 + orientation.index() as i8) % 4;
        Self::from_code(group * 4 + rotated)
    }
}

/// Code of an edge transition for a cardinal neighbour
fn edge_code(n: Neighbor) -> i8 {
    match n {
        Neighbor::N => 0,
        Neighbor::E => 1,
        Neighbor::S => 2,
        _ => 3,
    }
}

/// Code of the "up" corner transition (4-7) for a diagonal neighbour
fn corner_code(n: Neighbor) -> i8 {
    match n {
        Neighbor::NE => 4,
        Neighbor::SE => 5,
        Neighbor::SW => 6,
        _ => 7,
    }
}

/// Classify a single tile from its neighbours' tiers.
pub fn classify_tile(tiers: &Tilemap<LandType>, x: usize, y: usize) -> LandTransition {
    let own = *tiers.get(x, y);
    let higher = tiers.neighbor_set(x, y, |t| *t > own);

    // Step 1: edges touching higher ground, N, E, S, W
    let up: Vec<Neighbor> = CARDINALS.into_iter().filter(|n| higher.has(*n)).collect();
    match up.as_slice() {
        [] => {}
        [only] => return LandTransition::from_code(edge_code(*only)),
        [Neighbor::N, Neighbor::W, ..] => return LandTransition::NwUp,
        [first, ..] => return LandTransition::from_code(edge_code(*first) + 4),
    }

    // Step 2: a single diagonal touching higher ground
    let down: Vec<Neighbor> = DIAGONALS.into_iter().filter(|n| higher.has(*n)).collect();
    if let [only] = down.as_slice() {
        return LandTransition::from_code(corner_code(*only) + 4);
    }

    LandTransition::None
}

/// Count of tiles per transition code, for logging
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionSummary {
    pub flat: usize,
    pub by_code: [usize; 12],
}

impl TransitionSummary {
    pub fn blended(&self) -> usize {
        self.by_code.iter().sum()
    }
}

/// Classify every tile of the grid in one pass.
///
/// Each tile reads only its neighbours' tiers, never another tile's result,
/// so the pass is order independent.
pub fn classify_transitions(tiers: &Tilemap<LandType>) -> (Tilemap<LandTransition>, TransitionSummary) {
    let mut summary = TransitionSummary::default();
    let transitions = tiers.map(|x, y, _| {
        let t = classify_tile(tiers, x, y);
        match t.code() {
            -1 => summary.flat += 1,
            code => summary.by_code[code as usize] += 1,
        }
        t
    });

    info!(
        flat = summary.flat,
        blended = summary.blended(),
        "classified land transitions for {}x{} grid",
        tiers.width,
        tiers.height
    );

    (transitions, summary)
}
