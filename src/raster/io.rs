//! GDAL-backed raster reading, scratch grids and output writing.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use gdal::errors::GdalError;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};

use super::grid::{GridSpec, IDENTITY_TRANSFORM};
use crate::util::{Error, Result};

/// Base elevation raster, opened read-only. Only band 1 is used.
pub struct DemRaster {
    dataset: Dataset,
    path: PathBuf,
    grid: GridSpec,
    no_data: Option<f64>,
}

impl DemRaster {
    /// Open a raster and capture its grid and band-1 no-data declaration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dem_err = |source: GdalError| Error::DemOpen {
            path: path.to_path_buf(),
            source,
        };

        let dataset = Dataset::open(path).map_err(dem_err)?;
        let (width, height) = dataset.raster_size();
        let geo_transform = dataset.geo_transform().unwrap_or(IDENTITY_TRANSFORM);
        let projection = dataset.projection();
        let no_data = dataset.rasterband(1).map_err(dem_err)?.no_data_value();

        tracing::debug!(
            "DEM {}: {}x{}, no-data {:?}, geotransform {:?}",
            path.display(),
            width,
            height,
            no_data,
            geo_transform
        );

        Ok(Self {
            dataset,
            path: path.to_path_buf(),
            grid: GridSpec::new(width, height, geo_transform, projection),
            no_data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Band-1 no-data value, `None` when the band declares none.
    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    /// Number of bands in the source (only band 1 is ever modified).
    pub fn band_count(&self) -> isize {
        self.dataset.raster_count()
    }

    /// Read the whole of band 1 as `f32`, row-major.
    pub fn read_elevation(&self) -> Result<Vec<f32>> {
        let size = (self.grid.width, self.grid.height);
        let dem_err = |source: GdalError| Error::DemOpen {
            path: self.path.clone(),
            source,
        };
        let band = self.dataset.rasterband(1).map_err(dem_err)?;
        let buffer = band.read_as::<f32>((0, 0), size, size, None).map_err(dem_err)?;
        Ok(buffer.data)
    }

    /// Write `elevation` as band 1 of a full driver copy of this raster.
    ///
    /// The copy is built in a hidden temporary directory next to `output` and
    /// all of its files are moved into place once it is complete and closed.
    pub fn write_copy(&self, driver_name: &str, output: &Path, elevation: &[f32]) -> Result<()> {
        if elevation.len() != self.grid.len() {
            return Err(Error::output(
                output,
                format!(
                    "buffer holds {} cells, raster has {}",
                    elevation.len(),
                    self.grid.len()
                ),
            ));
        }

        let (parent, name) = split_output(output)?;
        let staging = tempfile::Builder::new()
            .prefix(".demburn-")
            .tempdir_in(parent)
            .map_err(|e| Error::output(output, e))?;
        let staged = staging.path().join(name);
        tracing::debug!("Writing {} via {}", output.display(), staged.display());

        self.copy_with_band(driver_name, &staged, elevation)
            .map_err(|e| Error::output(output, e))?;
        publish_staged(staging.path(), parent, name).map_err(|e| Error::output(output, e))?;
        // dropping `staging` removes anything left behind
        Ok(())
    }

    fn copy_with_band(
        &self,
        driver_name: &str,
        target: &Path,
        elevation: &[f32],
    ) -> std::result::Result<(), GdalError> {
        let driver = DriverManager::get_driver_by_name(driver_name)?;
        let out = self.dataset.create_copy(&driver, target, &[])?;
        let size = (self.grid.width, self.grid.height);
        let mut band = out.rasterband(1)?;
        band.write((0, 0), size, &Buffer::new(size, elevation.to_vec()))?;
        // `out` closes (and flushes) here, writing any sidecar files
        Ok(())
    }
}

/// Directory and file name of an output path.
fn split_output(output: &Path) -> Result<(&Path, &OsStr)> {
    let name = output
        .file_name()
        .ok_or_else(|| Error::output(output, "not a file path"))?;
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((parent, name))
}

/// Move every file the driver wrote in `staging` into `dest`.
///
/// Sidecars (headers, `.aux.xml`, `.prj`) go first so the main file only
/// appears once the dataset is complete.
fn publish_staged(staging: &Path, dest: &Path, main: &OsStr) -> std::io::Result<()> {
    let mut sidecars = Vec::new();
    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        if entry.file_name() != main {
            sidecars.push(entry.file_name());
        }
    }
    for name in &sidecars {
        fs::rename(staging.join(name), dest.join(name))?;
    }
    fs::rename(staging.join(main), dest.join(main))
}

/// Transient in-memory raster sharing the DEM's grid.
pub struct ScratchRaster {
    dataset: Dataset,
    grid: GridSpec,
}

impl ScratchRaster {
    /// Create a zero-filled `f32` MEM raster with `bands` bands.
    pub fn new(grid: &GridSpec, bands: usize) -> Result<Self> {
        let driver = DriverManager::get_driver_by_name("MEM")?;
        // MEM allocates band storage zeroed
        let mut dataset = driver.create_with_band_type::<f32, _>(
            "",
            grid.width as isize,
            grid.height as isize,
            bands as isize,
        )?;
        dataset.set_geo_transform(&grid.geo_transform)?;
        if !grid.projection.is_empty() {
            dataset.set_projection(&grid.projection)?;
        }
        Ok(Self {
            dataset,
            grid: grid.clone(),
        })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Read band `index` (1-based) as `f32`, row-major.
    pub fn read_band(&self, index: isize) -> Result<Vec<f32>> {
        let size = (self.grid.width, self.grid.height);
        let band = self.dataset.rasterband(index)?;
        Ok(band.read_as::<f32>((0, 0), size, size, None)?.data)
    }
}
