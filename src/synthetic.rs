//! Synthetic tier maps for demos and tests when no raster is supplied
//!
//! Fractal Perlin noise, pushed down towards the map edge so the land forms
//! an island, then cut into four tiers at fixed thresholds.

use noise::{NoiseFn, Perlin, Seedable};
use tracing::info;

use crate::terrain::LandType;
use crate::tilemap::Tilemap;

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticParams {
    /// Features per map width
    pub frequency: f64,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    /// How strongly height falls off towards the edge (0 disables)
    pub edge_falloff: f64,
    /// Upper bound of water, low and medium; anything above is high
    pub thresholds: [f64; 3],
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            frequency: 3.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            edge_falloff: 0.9,
            thresholds: [0.0, 0.25, 0.45],
        }
    }
}

fn fbm(noise: &impl NoiseFn<f64, 2>, x: f64, y: f64, params: &SyntheticParams) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..params.octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    if max_value > 0.0 {
        total / max_value
    } else {
        0.0
    }
}

pub fn tier_for_height(h: f64, thresholds: &[f64; 3]) -> LandType {
    if h < thresholds[0] {
        LandType::Water
    } else if h < thresholds[1] {
        LandType::Low
    } else if h < thresholds[2] {
        LandType::Medium
    } else {
        LandType::High
    }
}

/// Generate a `width` x `height` tier map from a seed.
pub fn generate_tiers(width: usize, height: usize, seed: u64, params: &SyntheticParams) -> Tilemap<LandType> {
    let noise = Perlin::new(1).set_seed(seed as u32);
    let span = width.max(height).max(1) as f64;

    let tiers = Tilemap::from_fn(width, height, |x, y| {
        let nx = (x as f64 + 0.5) / span;
        let ny = (y as f64 + 0.5) / span;
        let h = fbm(&noise, nx * params.frequency, ny * params.frequency, params);

        // 0 in the middle, 1 at the edge midpoints
        let ex = ((x as f64 + 0.5) / width as f64 - 0.5).abs() * 2.0;
        let ey = ((y as f64 + 0.5) / height as f64 - 0.5).abs() * 2.0;
        let edge = ex.max(ey);
        let h = h + 0.35 - params.edge_falloff * edge * edge;

        tier_for_height(h, &params.thresholds)
    });

    let mut counts = [0usize; 4];
    for (_, _, t) in tiers.iter() {
        counts[t.index()] += 1;
    }
    info!(seed, width, height, ?counts, "generated synthetic tiers");
    tiers
}
