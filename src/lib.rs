//! Isometric planet map library
//!
//! Re-exports modules for use by binaries and tools.

pub mod assets;
pub mod blend;
pub mod camera;
pub mod config;
pub mod error;
pub mod loader;
pub mod location;
pub mod map;
pub mod neighbors;
pub mod palette;
pub mod planet;
pub mod raster;
pub mod render;
pub mod roads;
pub mod synthetic;
pub mod terrain;
pub mod tilemap;
pub mod viewer;
