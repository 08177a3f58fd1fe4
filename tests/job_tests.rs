//! Job files and the background worker.

mod common;

use std::fs;

use common::*;
use demburn::worker::{CompositeWorker, WorkerEvent};
use demburn::{Error, Job};
use serde_json::json;
use tempfile::TempDir;

fn write_job(dir: &std::path::Path) -> std::path::PathBuf {
    write_flat_dem(&dir.join("base.tif"), 10.0);
    write_geojson(
        dir,
        "water.geojson",
        vec![
            feature(inside_cell(0, 0), json!({ "TYPE": "river", "ELEV": -2.0 })),
            feature(inside_cell(1, 0), json!({ "TYPE": "lake", "ELEV": -4.0 })),
        ],
    );
    height_layer(dir, "walls.geojson", inside_cell(3, 3), 1.5);

    let job = json!({
        "dem": "base.tif",
        "output": "modified_dem.tif",
        "layers": [
            { "path": "walls.geojson", "attribute_column": "height" },
            { "path": "water.geojson", "attribute_column": "ELEV",
              "filter_column": "TYPE", "filter_values": ["river"] }
        ]
    });
    let path = dir.join("job.json");
    fs::write(&path, job.to_string()).expect("Failed to write job");
    path
}

#[test]
fn test_job_file_runs_relative_to_its_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let job_path = write_job(dir.path());

    let job = Job::load(&job_path).expect("load job");
    let report = job.run().expect("run job");

    let out = dir.path().join("modified_dem.tif");
    assert_eq!(report.output, out);
    let data = read_band(&out);
    assert_eq!(data[0], 8.0);
    assert_eq!(data[1], 10.0);
    assert_eq!(data[15], 11.5);
    assert_eq!(report.layers[1].features_burned, 1);
}

#[test]
fn test_job_with_incomplete_filter_is_rejected_before_io() {
    let job = Job::from_json(
        r#"{ "dem": "missing.tif", "output": "out.tif",
             "layers": [ { "path": "a.shp", "attribute_column": "H", "filter_column": "TYPE" } ] }"#,
    )
    .expect("parse job");
    let err = job.run().unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {}", err);
}

#[test]
fn test_job_file_with_empty_paths_is_a_config_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let cases = [
        (json!({ "dem": "", "output": "out.tif" }), "No base DEM given"),
        (json!({ "dem": "base.tif", "output": "" }), "No output path given"),
    ];
    for (paths, expected) in cases {
        let mut job = paths;
        job["layers"] = json!([{ "path": "walls.geojson", "attribute_column": "height" }]);
        let path = dir.path().join("job.json");
        fs::write(&path, job.to_string()).expect("Failed to write job");

        let err = Job::load(&path).expect("load job").run().unwrap_err();
        match err {
            Error::Config(msg) => assert_eq!(msg, expected),
            other => panic!("unexpected error: {}", other),
        }
    }
}

#[test]
fn test_worker_reports_progress_then_result() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let job = Job::load(write_job(dir.path())).expect("load job");

    let worker = CompositeWorker::spawn(job);
    let mut progress = Vec::new();
    let finished = loop {
        match worker.rx.recv().expect("worker channel closed") {
            WorkerEvent::Progress { index, total, .. } => progress.push((index, total)),
            WorkerEvent::Finished { ok, message } => break (ok, message),
        }
    };

    assert_eq!(progress, vec![(0, 2), (1, 2)]);
    assert!(finished.0, "{}", finished.1);
    assert!(finished.1.contains("modified_dem.tif"));

    let report = worker.join().expect("worker result");
    assert_eq!(report.layers.len(), 2);
}

#[test]
fn test_worker_cancel_before_start() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let job = Job::load(write_job(dir.path())).expect("load job");

    let worker = CompositeWorker::spawn(job);
    worker.cancel();
    // cancellation is only observed at a checkpoint, so the run may already
    // be past the first layer; either way no partial output may remain
    match worker.join() {
        Err(Error::Cancelled) => assert!(!dir.path().join("modified_dem.tif").exists()),
        Ok(report) => assert!(report.output.exists()),
        Err(e) => panic!("unexpected error: {}", e),
    }
}
