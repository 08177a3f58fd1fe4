//! Layer rasterization: one overlay configuration to one contribution grid.
//!
//! Each participating feature burns its attribute value into every cell its
//! geometry touches (GDAL's ALL_TOUCHED rule). Overlapping features within
//! one layer replace each other in iteration order. A second band records
//! which cells were touched at all, so a burned 0.0 can be told apart from
//! "no feature here".

use std::path::PathBuf;

use gdal::raster::{rasterize, RasterizeOptions};
use gdal::vector::{Geometry, LayerAccess};
use serde::{Deserialize, Serialize};

use crate::raster::{GridSpec, ScratchRaster};
use crate::util::{Error, Result};
use crate::vector::{FeatureFilter, VectorSource};

const VALUE_BAND: isize = 1;
const COVERAGE_BAND: isize = 2;

/// One overlay to burn into the DEM.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    /// Vector dataset; only its first layer is read.
    pub path: PathBuf,
    /// Field holding the numeric value to burn.
    pub attribute_column: String,
    /// Restrict burning to matching features.
    pub filter: Option<FeatureFilter>,
}

impl LayerConfig {
    pub fn new(path: impl Into<PathBuf>, attribute_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attribute_column: attribute_column.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: FeatureFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Which contribution cells count as covered when accumulating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRule {
    /// A non-zero value means covered; a burned 0.0 is ignored.
    #[default]
    NonZero,
    /// The coverage mask decides, whatever the burned value.
    Mask,
}

/// Per-cell values and coverage produced for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    values: Vec<f32>,
    covered: Vec<bool>,
    features: usize,
}

impl Contribution {
    /// All-zero, uncovered contribution of `len` cells.
    pub fn empty(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
            covered: vec![false; len],
            features: 0,
        }
    }

    /// Build from raw parts. `values` and `covered` must have equal length.
    pub fn from_parts(values: Vec<f32>, covered: Vec<bool>, features: usize) -> Result<Self> {
        if values.len() != covered.len() {
            return Err(Error::config(format!(
                "Contribution has {} values but {} coverage cells",
                values.len(),
                covered.len()
            )));
        }
        Ok(Self {
            values,
            covered,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn coverage(&self) -> &[bool] {
        &self.covered
    }

    /// Number of features that were burned.
    pub fn features_burned(&self) -> usize {
        self.features
    }

    /// Number of cells touched by at least one feature.
    pub fn covered_cells(&self) -> usize {
        self.covered.iter().filter(|&&c| c).count()
    }

    /// Whether cell `i` contributes under `rule`.
    #[inline]
    pub fn is_covered(&self, i: usize, rule: CoverageRule) -> bool {
        match rule {
            CoverageRule::NonZero => self.values[i] != 0.0,
            CoverageRule::Mask => self.covered[i],
        }
    }
}

fn burn_options() -> RasterizeOptions {
    RasterizeOptions {
        all_touched: true,
        ..Default::default()
    }
}

/// Rasterize one layer onto a zeroed grid matching `grid`.
pub fn rasterize_layer(grid: &GridSpec, config: &LayerConfig) -> Result<Contribution> {
    let source = VectorSource::open(&config.path)?;
    source.require_field(&config.attribute_column)?;
    if let Some(filter) = &config.filter {
        source.require_field(filter.column())?;
        tracing::debug!("{}: filter {}", config.path.display(), filter);
        if filter.is_empty() {
            tracing::warn!(
                "{}: filter on '{}' has no values, nothing will be burned",
                config.path.display(),
                filter.column()
            );
            return Ok(Contribution::empty(grid.len()));
        }
    }

    let (geometries, burn_values) = collect_burns(&source, config)?;
    tracing::trace!(
        "{}: burning {} features from '{}'",
        config.path.display(),
        geometries.len(),
        config.attribute_column
    );

    let mut scratch = ScratchRaster::new(grid, 2)?;
    if !geometries.is_empty() {
        rasterize(
            scratch.dataset_mut(),
            &[VALUE_BAND],
            &geometries,
            &burn_values,
            Some(burn_options()),
        )?;
        let marks = vec![1.0; geometries.len()];
        rasterize(
            scratch.dataset_mut(),
            &[COVERAGE_BAND],
            &geometries,
            &marks,
            Some(burn_options()),
        )?;
    }

    let values = scratch.read_band(VALUE_BAND)?;
    let covered = scratch
        .read_band(COVERAGE_BAND)?
        .into_iter()
        .map(|m| m != 0.0)
        .collect();
    Contribution::from_parts(values, covered, geometries.len())
}

/// Geometries and burn values of the participating features, in layer order.
fn collect_burns(source: &VectorSource, config: &LayerConfig) -> Result<(Vec<Geometry>, Vec<f64>)> {
    let mut layer = source.layer()?;
    let mut geometries = Vec::new();
    let mut values = Vec::new();
    let mut without_geometry = 0usize;

    for feature in layer.features() {
        if let Some(filter) = &config.filter {
            let field = feature.field_as_string_by_name(filter.column())?;
            if !filter.matches(field.as_deref()) {
                continue;
            }
        }
        let Some(geometry) = feature.geometry() else {
            without_geometry += 1;
            continue;
        };
        // A null attribute burns 0.0, as GDAL's ATTRIBUTE= option does
        let value = feature
            .field_as_double_by_name(&config.attribute_column)?
            .unwrap_or(0.0);
        geometries.push(geometry.clone());
        values.push(value);
    }

    if without_geometry > 0 {
        tracing::debug!(
            "{}: skipped {} features without geometry",
            source.path().display(),
            without_geometry
        );
    }
    Ok((geometries, values))
}
