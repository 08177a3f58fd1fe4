//! Fixture helpers: small GeoTIFF DEMs and GeoJSON overlays.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use serde_json::{json, Value};

/// 1x1 unit pixels, origin at (0, 4): a 4x4 grid spans x 0..4, y 0..4.
pub const GT_4X4: [f64; 6] = [0.0, 1.0, 0.0, 4.0, 0.0, -1.0];

pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

/// Write a single-band float GeoTIFF.
pub fn write_dem(
    path: &Path,
    size: (usize, usize),
    geo_transform: [f64; 6],
    values: &[f32],
    no_data: Option<f64>,
    projection: &str,
) {
    write_dem_bands(path, size, geo_transform, &[values], no_data, projection);
}

/// Write a float GeoTIFF with one band per slice; `no_data` goes on band 1.
pub fn write_dem_bands(
    path: &Path,
    size: (usize, usize),
    geo_transform: [f64; 6],
    bands: &[&[f32]],
    no_data: Option<f64>,
    projection: &str,
) {
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut ds = driver
        .create_with_band_type::<f32, _>(
            path,
            size.0 as isize,
            size.1 as isize,
            bands.len() as isize,
        )
        .expect("Failed to create DEM");
    ds.set_geo_transform(&geo_transform).expect("set geotransform");
    if !projection.is_empty() {
        ds.set_projection(projection).expect("set projection");
    }
    for (i, values) in bands.iter().enumerate() {
        assert_eq!(values.len(), size.0 * size.1);
        let mut band = ds.rasterband(i as isize + 1).expect("band");
        if i == 0 && no_data.is_some() {
            band.set_no_data_value(no_data).expect("set no-data");
        }
        band.write((0, 0), size, &Buffer::new(size, values.to_vec()))
            .expect("write DEM band");
    }
}

/// 4x4 DEM filled with `value` on [`GT_4X4`].
pub fn write_flat_dem(path: &Path, value: f32) {
    write_dem(path, (4, 4), GT_4X4, &[value; 16], None, "");
}

/// Band 1 of a raster as `f32`.
pub fn read_band(path: &Path) -> Vec<f32> {
    read_band_n(path, 1)
}

/// Band `index` (1-based) of a raster as `f32`.
pub fn read_band_n(path: &Path, index: isize) -> Vec<f32> {
    let ds = Dataset::open(path).expect("Failed to open raster");
    let size = ds.raster_size();
    let band = ds.rasterband(index).expect("band");
    band.read_as::<f32>((0, 0), size, size, None)
        .expect("read band")
        .data
}

/// Hidden staging entries left in `dir`.
pub fn staging_leftovers(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(".demburn"))
        })
        .collect()
}

/// Axis-aligned polygon.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
    })
}

/// Polygon strictly inside cell `(col, row)` of [`GT_4X4`].
pub fn inside_cell(col: usize, row: usize) -> Value {
    let x = col as f64;
    let y = 4.0 - row as f64;
    rect(x + 0.2, y - 0.8, x + 0.8, y - 0.2)
}

pub fn feature(geometry: Value, properties: Value) -> Value {
    json!({ "type": "Feature", "properties": properties, "geometry": geometry })
}

/// Write a GeoJSON FeatureCollection and return its path.
pub fn write_geojson(dir: &Path, name: &str, features: Vec<Value>) -> PathBuf {
    let path = dir.join(name);
    let doc = json!({ "type": "FeatureCollection", "features": features });
    fs::write(&path, doc.to_string()).expect("Failed to write GeoJSON");
    path
}

/// Single-feature overlay with a `height` attribute.
pub fn height_layer(dir: &Path, name: &str, geometry: Value, height: f64) -> PathBuf {
    write_geojson(dir, name, vec![feature(geometry, json!({ "height": height }))])
}
