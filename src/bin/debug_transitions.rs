//! Debug script to output tiers and their transitions as ASCII
//!
//! Usage: debug_transitions [terrain.png]
//! Without a raster a synthetic map is generated.

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use planet_map::raster::load_tiers;
use planet_map::synthetic::{generate_tiers, SyntheticParams};
use planet_map::terrain::{classify_transitions, LandTransition, LandType};

fn tier_char(tier: LandType) -> char {
    match tier {
        LandType::Water => '~',
        LandType::Low => '.',
        LandType::Medium => 'm',
        LandType::High => 'M',
    }
}

/// Edges as n/e/s/w, two-edge corners as digits, diagonal corners as letters
fn transition_char(transition: LandTransition) -> char {
    match transition.code() {
        -1 => ' ',
        0 => 'n',
        1 => 'e',
        2 => 's',
        3 => 'w',
        4..=7 => char::from(b'4' + (transition.code() - 4) as u8),
        code => char::from(b'A' + (code - 8) as u8),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let width = 64;
    let height = 40;
    let seed = 12345u64;

    let tiers = match std::env::args().nth(1) {
        Some(path) => load_tiers(Path::new(&path))?,
        None => generate_tiers(width, height, seed, &SyntheticParams::default()),
    };
    let (transitions, summary) = classify_transitions(&tiers);

    let mut file = File::create("transition_debug.txt")?;

    writeln!(file, "=== TRANSITION DEBUG MAP ({}x{}) ===", tiers.width, tiers.height)?;
    writeln!(file)?;
    writeln!(file, "LEGEND (Tiers):")?;
    writeln!(file, "  ~ = Water   . = Low   m = Medium   M = High")?;
    writeln!(file, "LEGEND (Transitions):")?;
    writeln!(file, "  n/e/s/w = edge facing higher ground")?;
    writeln!(file, "  4-7 = two edges higher, corner NE, SE, SW, NW")?;
    writeln!(file, "  A-D = only one diagonal higher, NE, SE, SW, NW")?;
    writeln!(file)?;

    writeln!(file, "TIER MAP:")?;
    for y in 0..tiers.height {
        let line: String = (0..tiers.width).map(|x| tier_char(*tiers.get(x, y))).collect();
        writeln!(file, "{}", line)?;
    }
    writeln!(file)?;

    writeln!(file, "TRANSITION MAP:")?;
    for y in 0..transitions.height {
        let line: String = (0..transitions.width)
            .map(|x| transition_char(*transitions.get(x, y)))
            .collect();
        writeln!(file, "{}", line)?;
    }
    writeln!(file)?;

    writeln!(file, "STATISTICS:")?;
    writeln!(file, "  flat: {}", summary.flat)?;
    for (code, count) in summary.by_code.iter().enumerate() {
        if *count > 0 {
            let t = LandTransition::from_code(code as i8);
            writeln!(file, "  {:?} ({}): {}", t, transition_char(t), count)?;
        }
    }
    writeln!(file, "  blended total: {}", summary.blended())?;

    println!("Transition debug map written to transition_debug.txt");
    Ok(())
}
