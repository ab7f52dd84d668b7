use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use planet_map::config::LandData;
use planet_map::loader::load_assets;
use planet_map::planet::Planet;
use planet_map::raster::load_tiers;
use planet_map::roads::l_route;
use planet_map::synthetic::{generate_tiers, SyntheticParams};
use planet_map::tilemap::TileCoord;
use planet_map::viewer::{run_viewer, MapSession};

#[derive(Parser, Debug)]
#[command(name = "planet_map")]
#[command(about = "Isometric, rotatable planet map with blended terrain and roads")]
struct Args {
    /// Terrain raster, one pixel per tile (synthetic terrain if not given)
    #[arg(short, long)]
    terrain: Option<PathBuf>,

    /// Width of the synthetic map in tiles
    #[arg(short = 'W', long, default_value = "96")]
    width: usize,

    /// Height of the synthetic map in tiles
    #[arg(short = 'H', long, default_value = "64")]
    height: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Asset description document (built-in palette if not given)
    #[arg(short, long)]
    lands: Option<PathBuf>,

    /// Directory holding roads/ and nature/ sprite folders
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Road between two tiles, as "x1,y1:x2,y2". May be repeated
    #[arg(short, long, value_parser = parse_route)]
    road: Vec<(TileCoord, TileCoord)>,

    /// Tile to centre the view on, as "x,y"
    #[arg(short, long, value_parser = parse_tile)]
    goto: Option<TileCoord>,

    /// Quarter turns to apply after loading; negative turns left
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    rotate: i32,

    /// Zoom steps to apply after loading; negative zooms out
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    zoom: i32,

    /// Render this many ticks without a window and write PNG layers
    #[arg(long)]
    headless: Option<u32>,

    /// Output prefix for headless PNG layers
    #[arg(short, long, default_value = "planet")]
    out: String,
}

fn parse_tile(s: &str) -> Result<TileCoord, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y, got \"{s}\""))?;
    let x = x.trim().parse::<usize>().map_err(|e| format!("bad x in \"{s}\": {e}"))?;
    let y = y.trim().parse::<usize>().map_err(|e| format!("bad y in \"{s}\": {e}"))?;
    Ok(TileCoord::new(x, y))
}

fn parse_route(s: &str) -> Result<(TileCoord, TileCoord), String> {
    let (from, to) = s.split_once(':').ok_or_else(|| format!("expected x1,y1:x2,y2, got \"{s}\""))?;
    Ok((parse_tile(from)?, parse_tile(to)?))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    let data = match &args.lands {
        Some(path) => LandData::load_from_path(path)?,
        None => LandData::default(),
    };
    data.validate()?;

    let mut settings = data.view.clone();
    let seed = args.seed.or(settings.seed).unwrap_or_else(rand::random);
    settings.seed = Some(seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    info!(seed, "starting");

    let tiers = match &args.terrain {
        Some(path) => load_tiers(path)?,
        None => generate_tiers(args.width, args.height, seed, &SyntheticParams::default()),
    };

    // Everything below runs before the first frame
    let assets = load_assets(&data, args.assets.as_deref(), &mut rng)?;
    let mut planet = Planet::from_tiers(&tiers, settings.initial_scale, &mut rng);
    planet.assign_nature(&mut rng, settings.nature_density, &data.nature_weights());

    for (from, to) in &args.road {
        planet.add_roads(&l_route(*from, *to));
    }
    if let Some(rect) = planet.roads.bounds() {
        info!(roads = planet.roads.len(), "road network spans {}..{}", rect.min, rect.max);
    }

    if let Some(tile) = args.goto {
        planet.goto_tile(tile.tx, tile.ty);
    }
    for _ in 0..args.rotate.unsigned_abs() {
        if args.rotate > 0 {
            planet.rotate_right();
        } else {
            planet.rotate_left();
        }
    }
    for _ in 0..args.zoom.unsigned_abs() {
        planet.zoom(args.zoom > 0);
    }

    let mut session = MapSession::new(planet, assets, settings);

    match args.headless {
        Some(ticks) => {
            let drawn = session.run_ticks(ticks);
            info!(ticks, drawn, "headless render done");
            let written = session.save_layers(&args.out)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        None => run_viewer(session)?,
    }

    Ok(())
}
