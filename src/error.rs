//! Error types shared by the raster, vector and annotation modules.

use std::path::PathBuf;

use gdal::errors::GdalError;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A raster or vector datasource is missing, corrupt or has no driver.
    #[error("Unable to open {}: {source}", path.display())]
    ResourceOpen {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    /// An existing output datasource does not carry the expected schema.
    #[error("Schema mismatch in {}: field '{field}' expected {expected}, found {found}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        field: String,
        expected: String,
        found: String,
    },

    /// A ground-truth geometry is not a single-ring polygon.
    #[error("Unsupported geometry for feature {fid:?}: {reason}")]
    GeometryShape { fid: Option<u64>, reason: String },

    /// Polygonized regions cannot be paired with the supplied probabilities.
    #[error("{polygons} polygons but only {probabilities} probabilities")]
    ProbabilityCount { polygons: usize, probabilities: usize },

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Vector error: {0}")]
    Vector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, source: GdalError) -> Self {
        Error::ResourceOpen {
            path: path.into(),
            source,
        }
    }

    /// True for failures to open an input datasource.
    pub fn is_resource_open(&self) -> bool {
        matches!(self, Error::ResourceOpen { .. })
    }
}
