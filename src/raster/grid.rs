//! Grid geometry and no-data matching.

/// Affine pixel-to-world transform, in GDAL order:
/// `[origin_x, pixel_w, row_rot, origin_y, col_rot, pixel_h]`.
pub type GeoTransform = [f64; 6];

/// Transform GDAL reports for rasters without georeferencing.
pub const IDENTITY_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Size and georeferencing shared by the base DEM and every scratch grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    /// Projection as the WKT string read from the source, kept verbatim.
    pub projection: String,
}

impl GridSpec {
    pub fn new(
        width: usize,
        height: usize,
        geo_transform: GeoTransform,
        projection: impl Into<String>,
    ) -> Self {
        Self {
            width,
            height,
            geo_transform,
            projection: projection.into(),
        }
    }

    /// Number of cells (W x H).
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major buffer index of `(col, row)`.
    #[inline]
    pub fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    /// World coordinates of a pixel-space position.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.geo_transform;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }

    /// World-space extent as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(w, 0.0),
            self.pixel_to_world(0.0, h),
            self.pixel_to_world(w, h),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }
}

/// Declared no-data sentinel of the elevation band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoData {
    value: f64,
    tolerance: f64,
}

impl NoData {
    pub const DEFAULT_TOLERANCE: f64 = 1e-5;

    pub fn new(value: f64) -> Self {
        Self::with_tolerance(value, Self::DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(value: f64, tolerance: f64) -> Self {
        Self { value, tolerance }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// True if `cell` is the sentinel, within tolerance.
    /// A NaN sentinel matches NaN cells.
    #[inline]
    pub fn matches(&self, cell: f32) -> bool {
        if self.value.is_nan() {
            return cell.is_nan();
        }
        (cell as f64 - self.value).abs() < self.tolerance
    }
}
