use std::path::PathBuf;

use thiserror::Error;

/// Problems with the asset description document. Fatal at load time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset description parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tier \"{0}\" has no base colors, cannot build its base image")]
    MissingPalette(&'static str),
    #[error("malformed palette entry \"{0}\", expected \"#rrggbb;weight\"")]
    PaletteEntry(String),
    #[error("bad hex color \"{0}\"")]
    HexColor(String),
}

/// Problems turning a raster into a tier grid.
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("terrain image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("terrain image is empty")]
    Empty,
    #[error("unknown terrain color at ({x},{y}): green channel {green}")]
    UnknownColor { x: u32, y: u32, green: u8 },
}

/// A sprite that could not be decoded. Callers log it and leave the slot empty.
#[derive(Error, Debug)]
#[error("failed to load sprite {path}: {source}")]
pub struct AssetError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Failures of the interactive window or of writing rendered layers.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
    #[error("failed to write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
