//! DEM compositing: burn every configured layer into the base elevation.
//!
//! Layers are applied in order and strictly additively. Cells equal to the
//! DEM's declared no-data value are never touched.
//!
//! ## Example
//!
//! ```ignore
//! use demburn::{composite, FeatureFilter, LayerConfig};
//!
//! let layers = vec![
//!     LayerConfig::new("buildings.shp", "HEIGHT"),
//!     LayerConfig::new("water.shp", "DEPTH")
//!         .with_filter(FeatureFilter::new("TYPE", ["river"])),
//! ];
//! let report = composite("base.tif", &layers, "modified_dem.tif")?;
//! ```

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::burn::{rasterize_layer, Contribution, CoverageRule, LayerConfig};
use crate::raster::{DemRaster, NoData};
use crate::util::{Error, Result};

/// Tunables for a compositing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    /// How a contribution cell is judged covered.
    pub coverage: CoverageRule,
    /// GDAL driver for the output copy.
    pub driver: String,
    /// Absolute tolerance when matching the no-data value.
    pub nodata_tolerance: f64,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            coverage: CoverageRule::NonZero,
            driver: "GTiff".to_string(),
            nodata_tolerance: NoData::DEFAULT_TOLERANCE,
        }
    }
}

/// Cell counts from accumulating one contribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulateStats {
    /// Cells that received the contribution.
    pub modified: usize,
    /// Covered cells left alone because they hold no-data.
    pub nodata_skipped: usize,
}

/// Add `contribution` into `elevation`, skipping no-data cells.
///
/// Both grids must have the same cell count; `elevation` is untouched otherwise.
pub fn accumulate(
    elevation: &mut [f32],
    no_data: Option<NoData>,
    contribution: &Contribution,
    rule: CoverageRule,
) -> Result<AccumulateStats> {
    if elevation.len() != contribution.len() {
        return Err(Error::config(format!(
            "Contribution covers {} cells, DEM has {}",
            contribution.len(),
            elevation.len()
        )));
    }
    let mut stats = AccumulateStats::default();
    let values = contribution.values();
    for (i, cell) in elevation.iter_mut().enumerate() {
        if !contribution.is_covered(i, rule) {
            continue;
        }
        if no_data.is_some_and(|nd| nd.matches(*cell)) {
            stats.nodata_skipped += 1;
            continue;
        }
        *cell += values[i];
        stats.modified += 1;
    }
    Ok(stats)
}

/// Outcome of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerReport {
    pub path: PathBuf,
    pub features_burned: usize,
    pub cells_covered: usize,
    pub cells_modified: usize,
    pub cells_nodata: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeReport {
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub no_data: Option<f64>,
    pub layers: Vec<LayerReport>,
}

/// Passed to the checkpoint callback before each layer is processed.
#[derive(Debug, Clone, Copy)]
pub struct LayerProgress<'a> {
    /// Zero-based position of the layer about to run.
    pub index: usize,
    pub total: usize,
    pub layer: &'a LayerConfig,
}

/// Runs compositing jobs with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    options: CompositeOptions,
}

impl Compositor {
    pub fn new(options: CompositeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// Burn `layers` into the DEM at `dem` and write the result to `output`.
    pub fn run(
        &self,
        dem: impl AsRef<Path>,
        layers: &[LayerConfig],
        output: impl AsRef<Path>,
    ) -> Result<CompositeReport> {
        self.run_with(dem, layers, output, |_| ControlFlow::Continue(()))
    }

    /// Like [`run`](Self::run), calling `checkpoint` before every layer.
    ///
    /// Returning `ControlFlow::Break` stops the run with [`Error::Cancelled`];
    /// nothing is written in that case.
    pub fn run_with<F>(
        &self,
        dem: impl AsRef<Path>,
        layers: &[LayerConfig],
        output: impl AsRef<Path>,
        mut checkpoint: F,
    ) -> Result<CompositeReport>
    where
        F: FnMut(&LayerProgress<'_>) -> ControlFlow<()>,
    {
        let (dem, output) = (dem.as_ref(), output.as_ref());
        let _span = tracing::info_span!("composite", dem = %dem.display()).entered();

        let raster = DemRaster::open(dem)?;
        let grid = raster.grid().clone();
        let no_data = raster
            .no_data()
            .map(|v| NoData::with_tolerance(v, self.options.nodata_tolerance));
        let mut elevation = raster.read_elevation()?;

        tracing::info!(
            "Burning {} layers into {} ({}x{})",
            layers.len(),
            dem.display(),
            grid.width,
            grid.height
        );

        let mut reports = Vec::with_capacity(layers.len());
        for (index, layer) in layers.iter().enumerate() {
            let progress = LayerProgress {
                index,
                total: layers.len(),
                layer,
            };
            if checkpoint(&progress).is_break() {
                tracing::info!("Cancelled before layer {}/{}", index + 1, layers.len());
                return Err(Error::Cancelled);
            }

            let contribution = rasterize_layer(&grid, layer)?;
            let stats = accumulate(&mut elevation, no_data, &contribution, self.options.coverage)?;
            tracing::debug!(
                "Layer {}/{} {}: {} features, {} cells covered, {} modified, {} no-data",
                index + 1,
                layers.len(),
                layer.path.display(),
                contribution.features_burned(),
                contribution.covered_cells(),
                stats.modified,
                stats.nodata_skipped
            );
            reports.push(LayerReport {
                path: layer.path.clone(),
                features_burned: contribution.features_burned(),
                cells_covered: contribution.covered_cells(),
                cells_modified: stats.modified,
                cells_nodata: stats.nodata_skipped,
            });
        }

        raster.write_copy(&self.options.driver, output, &elevation)?;
        tracing::info!("Saved to {}", output.display());

        Ok(CompositeReport {
            output: output.to_path_buf(),
            width: grid.width,
            height: grid.height,
            no_data: raster.no_data(),
            layers: reports,
        })
    }
}

/// Burn `layers` into `dem` with default options and write `output`.
pub fn composite(
    dem: impl AsRef<Path>,
    layers: &[LayerConfig],
    output: impl AsRef<Path>,
) -> Result<CompositeReport> {
    Compositor::default().run(dem, layers, output)
}
