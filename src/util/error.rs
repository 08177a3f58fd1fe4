//! Error types for DEM burning.

use std::path::PathBuf;

use gdal::errors::GdalError;
use thiserror::Error;

/// Main error type for demburn operations.
///
/// Every variant is fatal to the run that produced it. The `Display` text is
/// meant to be shown to an end user as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// A vector dataset could not be opened, or has no layer
    #[error("Could not open vector dataset {path}: {source}")]
    DatasetOpen {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    /// The base DEM could not be opened or is not a usable raster
    #[error("Could not open base DEM {path}: {source}")]
    DemOpen {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    /// A configured attribute or filter column is missing from the layer schema
    #[error("Column '{column}' not found in {path}")]
    AttributeRead { path: PathBuf, column: String },

    /// The output raster could not be created or written
    #[error("Could not write output raster {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    /// Job or layer configuration is incomplete or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The run was stopped at a layer checkpoint
    #[error("Processing cancelled")]
    Cancelled,

    /// The background worker thread panicked; carries the panic message
    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    /// GDAL failure while working on scratch data
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job file is not valid JSON for the expected schema
    #[error("Invalid job file: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error from a string.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an output error for `path`.
    pub fn output(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatasetOpen { .. } => "dataset-open",
            Self::DemOpen { .. } => "dem-open",
            Self::AttributeRead { .. } => "attribute-read",
            Self::OutputWrite { .. } => "output-write",
            Self::Config(_) => "config",
            Self::Cancelled => "cancelled",
            Self::WorkerPanicked(_) => "worker-panic",
            Self::Gdal(_) => "gdal",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

/// Result type alias for demburn operations.
pub type Result<T> = std::result::Result<T, Error>;
