//! demburn CLI - Burn vector overlay heights into a DEM.

use std::env;
use std::ops::ControlFlow;
use std::path::Path;
use std::process;

use demburn::job::Job;
use demburn::raster::DemRaster;
use demburn::vector::{self, suggest_attribute_column, suggest_filter_column};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("demburn={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // Info command - DEM grid summary
        "info" | "i" => {
            if filtered_args.len() < 2 {
                usage_error("missing raster argument", "demburn info <dem.tif>");
            }
            cmd_info(filtered_args[1]);
        }

        // Fields command - vector schema
        "fields" | "f" => {
            if filtered_args.len() < 2 {
                usage_error("missing dataset argument", "demburn fields <layer.shp>");
            }
            cmd_fields(filtered_args[1]);
        }

        // Values command - distinct values of one field
        "values" | "vals" => {
            if filtered_args.len() < 3 {
                usage_error("missing arguments", "demburn values <layer.shp> <field>");
            }
            cmd_values(filtered_args[1], filtered_args[2]);
        }

        // Run command - execute a job file
        "run" | "r" => {
            if filtered_args.len() < 2 {
                usage_error("missing job file", "demburn run <job.json> [--json]");
            }
            let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
            cmd_run(filtered_args[1], json_mode);
        }

        "version" | "-V" | "--version" => println!("{}", demburn::build_info()),

        "help" | "h" | "-h" | "--help" => print_help(),

        // Default: a .json file runs as a job
        _ => {
            let path = Path::new(filtered_args[0]);
            if path.exists() && path.extension().is_some_and(|e| e == "json") {
                cmd_run(filtered_args[0], false);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                process::exit(1);
            }
        }
    }
}

fn usage_error(msg: &str, usage: &str) -> ! {
    eprintln!("Error: {}", msg);
    eprintln!("Usage: {}", usage);
    process::exit(1);
}

fn fail(context: &str, err: demburn::Error) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(1);
}

fn print_help() {
    println!("demburn - Burn vector overlay heights into a DEM");
    println!();
    println!("USAGE:");
    println!("    demburn [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <dem>             Show raster size, georeferencing and no-data");
    println!("    f, fields  <vector>          List attribute fields of the first layer");
    println!("    values     <vector> <field>  List distinct non-empty values of a field");
    println!("    r, run     <job.json>        Burn all layers of a job file (--json for report)");
    println!("    version                      Show version, build stamp and GDAL release");
    println!("    h, help                      Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    demburn info base.tif");
    println!("    demburn fields buildings.shp");
    println!("    demburn values water.shp TYPE");
    println!("    demburn run job.json");
    println!();
    println!("NOTES:");
    println!("    - Passing a .json file directly is equivalent to 'run'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

fn cmd_info(path: &str) {
    let dem = DemRaster::open(path).unwrap_or_else(|e| fail("Failed to open DEM", e));
    let grid = dem.grid();
    let (min_x, min_y, max_x, max_y) = grid.bounds();

    println!("Raster: {}", path);
    println!("Size:   {} x {} ({} bands)", grid.width, grid.height, dem.band_count());
    println!("Transform: {:?}", grid.geo_transform);
    println!("Bounds: ({}, {}) - ({}, {})", min_x, min_y, max_x, max_y);
    match dem.no_data() {
        Some(v) => println!("No-data: {}", v),
        None => println!("No-data: none"),
    }
    if grid.projection.is_empty() {
        println!("Projection: none");
    } else {
        println!("Projection:");
        println!("  {}", grid.projection);
    }
}

fn cmd_fields(path: &str) {
    let fields = vector::list_fields(path).unwrap_or_else(|e| fail("Failed to read fields", e));
    let height = suggest_attribute_column(&fields);
    let filter = suggest_filter_column(&fields);

    println!("Dataset: {}", path);
    println!("Fields ({}):", fields.len());
    for name in &fields {
        let mut tags = Vec::new();
        if Some(name.as_str()) == height {
            tags.push("height");
        }
        if Some(name.as_str()) == filter {
            tags.push("filter");
        }
        if tags.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {} [{}]", name, tags.join(", "));
        }
    }
}

fn cmd_values(path: &str, field: &str) {
    let values = vector::list_distinct_values(path, field)
        .unwrap_or_else(|e| fail("Failed to read values", e));
    println!("{} distinct values of '{}':", values.len(), field);
    for value in &values {
        println!("  {}", value);
    }
}

fn cmd_run(path: &str, json_mode: bool) {
    let job = Job::load(path).unwrap_or_else(|e| fail("Failed to load job", e));

    let report = job
        .run_with(|progress| {
            if !json_mode {
                println!(
                    "[{}/{}] {}",
                    progress.index + 1,
                    progress.total,
                    progress.layer.path.display()
                );
            }
            ControlFlow::Continue(())
        })
        .unwrap_or_else(|e| fail("Error", e));

    if json_mode {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode report: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!();
    for layer in &report.layers {
        println!(
            "  {}: {} features, {} cells raised ({} no-data cells kept)",
            layer.path.display(),
            layer.features_burned,
            layer.cells_modified,
            layer.cells_nodata
        );
    }
    println!("Saved to: {}", report.output.display());
}
