//! Raster I/O for the base DEM and the per-layer scratch grids.
//!
//! - [`GridSpec`] - Size, geotransform and projection of a grid
//! - [`NoData`] - Tolerant no-data matching
//! - [`DemRaster`] - Read-only base DEM plus output writing
//! - [`ScratchRaster`] - In-memory raster used while rasterizing a layer

mod grid;
mod io;

pub use grid::{GeoTransform, GridSpec, NoData, IDENTITY_TRANSFORM};
pub use io::{DemRaster, ScratchRaster};
