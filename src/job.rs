//! Job files: a base DEM, an output path and the ordered layer list.
//!
//! ```json
//! {
//!   "dem": "base.tif",
//!   "output": "modified_dem.tif",
//!   "options": { "coverage": "non_zero" },
//!   "layers": [
//!     { "path": "buildings.shp", "attribute_column": "HEIGHT" },
//!     { "path": "water.shp", "attribute_column": "ELEV",
//!       "filter_column": "TYPE", "filter_values": ["river"] }
//!   ]
//! }
//! ```
//!
//! Relative paths are taken relative to the job file's directory.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::burn::LayerConfig;
use crate::compose::{CompositeOptions, CompositeReport, Compositor, LayerProgress};
use crate::util::{Error, Result};
use crate::vector::FeatureFilter;

/// A layer entry as written in a job file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub path: PathBuf,
    #[serde(default)]
    pub attribute_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_values: Option<Vec<String>>,
}

impl LayerRecord {
    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Validate the record and turn it into a [`LayerConfig`].
    pub fn to_config(&self) -> Result<LayerConfig> {
        if self.attribute_column.trim().is_empty() {
            return Err(Error::config(format!(
                "Missing height attribute for {}",
                self.display_name()
            )));
        }
        let column = self
            .filter_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let values = self.filter_values.as_deref().unwrap_or_default();

        let config = LayerConfig::new(&self.path, &self.attribute_column);
        match (column, values.is_empty()) {
            (None, true) => Ok(config),
            (Some(column), false) => {
                Ok(config.with_filter(FeatureFilter::new(column, values.iter().cloned())))
            }
            _ => Err(Error::config(format!(
                "Incomplete filter configuration for {}",
                self.display_name()
            ))),
        }
    }
}

/// A complete compositing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub dem: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub options: CompositeOptions,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
}

impl Job {
    /// Read a job file and resolve its relative paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut job = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        tracing::debug!("Loaded job {} ({} layers)", path.display(), job.layers.len());
        Ok(job)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Make every relative path in the job relative to `base`.
    ///
    /// Empty paths stay empty so validation still reports them as missing.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.dem);
        resolve(&mut self.output);
        for layer in &mut self.layers {
            resolve(&mut layer.path);
        }
    }

    /// Validate the whole job and return its layers in order.
    pub fn layer_configs(&self) -> Result<Vec<LayerConfig>> {
        if self.dem.as_os_str().is_empty() {
            return Err(Error::config("No base DEM given"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::config("No output path given"));
        }
        if self.layers.is_empty() {
            return Err(Error::config("At least one layer is required"));
        }
        self.layers.iter().map(LayerRecord::to_config).collect()
    }

    pub fn run(&self) -> Result<CompositeReport> {
        self.run_with(|_| ControlFlow::Continue(()))
    }

    /// Validate and run, with a checkpoint before each layer.
    pub fn run_with<F>(&self, checkpoint: F) -> Result<CompositeReport>
    where
        F: FnMut(&LayerProgress<'_>) -> ControlFlow<()>,
    {
        let layers = self.layer_configs()?;
        Compositor::new(self.options.clone()).run_with(&self.dem, &layers, &self.output, checkpoint)
    }
}
