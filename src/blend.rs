//! Procedural blend masks for terrain transitions
//!
//! A lower-tier tile that borders higher ground is drawn as its own base art
//! with the upper tier's art laid over it through a soft alpha mask. The mask
//! is a distance field measured from one or two diamond edges, nudged by a
//! little random sparkle and sharpened by a piecewise remap.

use image::{imageops, RgbaImage};
use rand::Rng;

use crate::location::{boundary_intersection, round_half_up, Direction, ScreenPoint, TILE_HEIGHT, TILE_WIDTH};
use crate::terrain::LandTransition;

/// 1 / half-diagonal of a tile (hypot(32, 16))
fn max_d() -> f64 {
    1.0 / (32.0f64 * 32.0 + 16.0 * 16.0).sqrt()
}

/// Upper bound of the random sparkle added to every mask pixel
pub const SPARKLE: f64 = 1.0 / 75.0;

/// Sample points sit this far above the pixel being shaded
const SAMPLE_LIFT: f64 = 24.0;
/// Boundary points are pushed this far back down before measuring
const BOUNDARY_DROP: f64 = 32.0;

/// One distance term of a mask: the edge to measure from, the extents of
/// the diamond that edge belongs to, and whether the distance is flipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendTerm {
    pub direction: Direction,
    pub box_w: f64,
    pub box_h: f64,
    pub inverted: bool,
}

const fn term(direction: Direction, box_w: f64, box_h: f64, inverted: bool) -> BlendTerm {
    BlendTerm {
        direction,
        box_w,
        box_h,
        inverted,
    }
}

/// The tuned edge shapes. These offsets were fitted by eye and define the
/// look of every transition; change them and the tiles stop lining up.
pub fn blend_terms(transition: LandTransition) -> &'static [BlendTerm] {
    use Direction as D;
    use LandTransition as T;
    const NORTH: [BlendTerm; 1] = [term(D::South, 16.0, 8.0, false)];
    const EAST: [BlendTerm; 1] = [term(D::East, 64.0, 32.0, true)];
    const SOUTH: [BlendTerm; 1] = [term(D::South, 36.0, 16.0, true)];
    const WEST: [BlendTerm; 1] = [term(D::East, 48.0, 24.0, false)];
    const NE_UP: [BlendTerm; 2] = [term(D::South, 24.0, 12.0, false), term(D::East, 16.0, 8.0, false)];
    const SE_UP: [BlendTerm; 2] = [term(D::South, 24.0, 12.0, true), term(D::East, 16.0, 8.0, false)];
    const SW_UP: [BlendTerm; 2] = [term(D::South, 24.0, 12.0, true), term(D::East, 56.0, 28.0, false)];
    const NW_UP: [BlendTerm; 2] = [term(D::South, 24.0, 12.0, false), term(D::East, 24.0, 12.0, true)];
    const NE_DOWN: [BlendTerm; 2] = [term(D::North, 48.0, 24.0, false), term(D::East, 76.0, 38.0, true)];
    const SE_DOWN: [BlendTerm; 2] = [term(D::South, 40.0, 28.0, true), term(D::East, 76.0, 38.0, true)];
    const SW_DOWN: [BlendTerm; 2] = [term(D::South, 48.0, 24.0, true), term(D::West, 48.0, 24.0, true)];
    const NW_DOWN: [BlendTerm; 2] = [term(D::North, 64.0, 32.0, false), term(D::West, 48.0, 24.0, true)];

    match transition {
        T::None => &[],
        T::North => &NORTH,
        T::East => &EAST,
        T::South => &SOUTH,
        T::West => &WEST,
        T::NeUp => &NE_UP,
        T::SeUp => &SE_UP,
        T::SwUp => &SW_UP,
        T::NwUp => &NW_UP,
        T::NeDown => &NE_DOWN,
        T::SeDown => &SE_DOWN,
        T::SwDown => &SW_DOWN,
        T::NwDown => &NW_DOWN,
    }
}

/// Normalised distance from pixel (x, y) to a term's edge.
fn term_distance(t: &BlendTerm, x: f64, y: f64) -> f64 {
    let sample = ScreenPoint::new(x, y - SAMPLE_LIFT);
    let border = boundary_intersection(t.direction, sample, t.box_w, t.box_h);
    let dx = x - round_half_up(border.x);
    let dy = y - round_half_up(border.y + BOUNDARY_DROP);
    let d = (dx * dx + dy * dy).sqrt() * max_d();
    if t.inverted {
        1.0 - d
    } else {
        d
    }
}

/// Raw coverage of the upper tier at a pixel, before sparkle and remap.
pub fn raw_coverage(transition: LandTransition, x: u32, y: u32) -> f64 {
    let terms = blend_terms(transition);
    if terms.is_empty() {
        return 0.0;
    }
    let sum: f64 = terms.iter().map(|t| term_distance(t, x as f64, y as f64)).sum();
    sum / terms.len() as f64
}

/// Sharpen a coverage value. Edge transitions and corner transitions use
/// different dead zones.
pub fn remap(transition: LandTransition, d: f64) -> f64 {
    if transition.is_edge() {
        if d > 0.60 {
            1.0
        } else if (0.45..0.50).contains(&d) {
            d - 0.10
        } else if (0.35..0.45).contains(&d) {
            d - 0.20
        } else if d < 0.35 {
            0.0
        } else {
            d
        }
    } else if d < 0.36 {
        0.0
    } else if (0.35..0.40).contains(&d) {
        d - 0.10
    } else if (0.40..0.46).contains(&d) {
        d + 0.05
    } else {
        1.0
    }
}

/// Per-pixel coverage of the upper tier for a 64x32 tile, row-major.
pub fn blend_mask<R: Rng>(transition: LandTransition, rng: &mut R) -> Vec<f64> {
    let mut mask = Vec::with_capacity((TILE_WIDTH * TILE_HEIGHT) as usize);
    for y in 0..TILE_HEIGHT {
        for x in 0..TILE_WIDTH {
            let sparkle = rng.gen::<f64>() * SPARKLE;
            let d = raw_coverage(transition, x, y) + sparkle;
            mask.push(remap(transition, d));
        }
    }
    mask
}

/// Scale the alpha of every visible pixel by its mask value.
pub fn apply_mask(image: &mut RgbaImage, mask: &[f64]) {
    let width = image.width();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let alpha = pixel.0[3];
        if alpha == 0 {
            continue;
        }
        let d = mask.get((y * width + x) as usize).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        pixel.0[3] = round_half_up(alpha as f64 * d) as u8;
    }
}

/// Composite `upper` through the transition mask onto a copy of `lower`.
pub fn blend_tile<R: Rng>(lower: &RgbaImage, upper: &RgbaImage, transition: LandTransition, rng: &mut R) -> RgbaImage {
    let mask = blend_mask(transition, rng);
    let mut masked = upper.clone();
    apply_mask(&mut masked, &mask);

    let mut out = lower.clone();
    imageops::overlay(&mut out, &masked, 0, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_every_transition_has_terms() {
        for t in LandTransition::BLENDED {
            let n = blend_terms(t).len();
            if t.is_edge() {
                assert_eq!(n, 1, "{t:?}");
            } else {
                assert_eq!(n, 2, "{t:?}");
            }
        }
        assert!(blend_terms(LandTransition::None).is_empty());
    }

    #[test]
    fn test_edge_remap_thresholds() {
        let t = LandTransition::North;
        assert_eq!(remap(t, 0.61), 1.0);
        assert!((remap(t, 0.47) - 0.37).abs() < 1e-12);
        assert!((remap(t, 0.40) - 0.20).abs() < 1e-12);
        assert_eq!(remap(t, 0.30), 0.0);
        // 0.50..=0.60 passes through
        assert_eq!(remap(t, 0.55), 0.55);
    }

    #[test]
    fn test_corner_remap_thresholds() {
        let t = LandTransition::NeDown;
        assert_eq!(remap(t, 0.30), 0.0);
        assert!((remap(t, 0.38) - 0.28).abs() < 1e-12);
        assert!((remap(t, 0.42) - 0.47).abs() < 1e-12);
        assert_eq!(remap(t, 0.46), 1.0);
        assert_eq!(remap(t, 0.9), 1.0);
    }

    #[test]
    fn test_mask_is_seed_reproducible() {
        let a = blend_mask(LandTransition::SeUp, &mut ChaCha8Rng::seed_from_u64(3));
        let b = blend_mask(LandTransition::SeUp, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64 * 32);
    }

    #[test]
    fn test_edge_masks_are_binary_enough() {
        // every remapped edge value is 0, 1, or in the narrow pass band
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for t in [LandTransition::North, LandTransition::East, LandTransition::South, LandTransition::West] {
            for d in blend_mask(t, &mut rng) {
                assert!(d == 0.0 || d == 1.0 || (0.15..=0.60).contains(&d), "{t:?} {d}");
            }
        }
    }

    #[test]
    fn test_blend_keeps_lower_where_mask_is_zero() {
        let lower = RgbaImage::from_pixel(64, 32, Rgba([0, 0, 255, 255]));
        let upper = RgbaImage::from_pixel(64, 32, Rgba([0, 255, 0, 255]));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mask = blend_mask(LandTransition::North, &mut ChaCha8Rng::seed_from_u64(5));
        let out = blend_tile(&lower, &upper, LandTransition::North, &mut rng);

        for (x, y, p) in out.enumerate_pixels() {
            let d = mask[(y * 64 + x) as usize];
            if d == 0.0 {
                assert_eq!(*p, Rgba([0, 0, 255, 255]));
            } else if d == 1.0 {
                assert_eq!(*p, Rgba([0, 255, 0, 255]));
            }
        }
    }

    #[test]
    fn test_apply_mask_skips_transparent() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 0]));
        img.put_pixel(1, 0, Rgba([9, 9, 9, 200]));
        apply_mask(&mut img, &[1.0, 0.5]);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(1, 0).0[3], 100);
    }
}
