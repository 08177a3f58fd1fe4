//! # demburn
//!
//! Burn heights from vector overlays into a DEM raster.
//!
//! Each overlay layer names a vector dataset and an attribute column holding
//! a height. Features are rasterized onto the DEM's own grid (every touched
//! cell counts) and their values are added to the elevation band. Cells that
//! hold the DEM's no-data value are never changed. The result is written as
//! a copy of the source raster, so georeferencing, projection and no-data
//! declaration carry over unchanged.
//!
//! ## Modules
//!
//! - [`util`] - Errors
//! - [`raster`] - Base DEM reading, scratch grids, output writing
//! - [`vector`] - Field listing, distinct values, attribute filters
//! - [`burn`] - Rasterizing one layer into a contribution grid
//! - [`compose`] - Accumulating layers into the DEM
//! - [`job`] - JSON job files
//! - [`worker`] - Running a job on a background thread
//!
//! ## Example
//!
//! ```ignore
//! use demburn::{composite, LayerConfig};
//!
//! let layers = [LayerConfig::new("buildings.shp", "HEIGHT")];
//! let report = composite("base.tif", &layers, "modified_dem.tif")?;
//! println!("{} cells raised", report.layers[0].cells_modified);
//! ```

pub mod util;
pub mod raster;
pub mod vector;
pub mod burn;
pub mod compose;
pub mod job;
pub mod worker;

// Re-export commonly used types
pub use util::{Error, Result};
pub use burn::{rasterize_layer, Contribution, CoverageRule, LayerConfig};
pub use compose::{composite, CompositeOptions, CompositeReport, Compositor, LayerReport};
pub use job::Job;
pub use vector::{list_distinct_values, list_fields, FeatureFilter};

/// Version line with build stamp, profile, target and the linked GDAL release.
pub fn build_info() -> String {
    format!(
        "demburn {} ({} build for {}, {}; GDAL {})",
        env!("CARGO_PKG_VERSION"),
        env!("DEMBURN_BUILD_PROFILE"),
        env!("DEMBURN_TARGET"),
        env!("DEMBURN_BUILD_STAMP"),
        gdal::version::version_info("RELEASE_NAME"),
    )
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::burn::{CoverageRule, LayerConfig};
    pub use crate::compose::{composite, CompositeOptions, Compositor, LayerProgress};
    pub use crate::job::Job;
    pub use crate::raster::{DemRaster, GridSpec};
    pub use crate::vector::FeatureFilter;
}
