//! Georeferenced tiles to COCO converter
//!
//! This library prepares tiled aerial orthomosaics for object-detection
//! training: it checks every tile against a ground-truth vector layer, turns
//! the intersecting footprints into pixel-space COCO annotations, and turns
//! raster prediction masks back into georeferenced polygons.

pub mod annotate;
pub mod bridge;
pub mod coco;
pub mod config;
pub mod error;
pub mod geotransform;
pub mod io;
pub mod pipeline;
pub mod raster;
pub mod triage;
pub mod types;
pub mod utils;
pub mod vector;

// Re-export commonly used types and functions
pub use annotate::{AnnotationSession, TileClass, TileOutcome, TileRouter};
pub use config::{AnnotateArgs, MaskArgs, OpenErrorPolicy, TriageArgs};
pub use error::{Error, Result};
pub use geotransform::{BoundingBox, GeoTransform};
pub use io::MoveRouter;
pub use pipeline::{run_annotation, run_mask, run_triage};
pub use raster::{Raster, RasterArray, RasterShape};
pub use types::{RunStats, TriageStats};
pub use vector::{AccessMode, VectorLayer};

// Raster/vector bridge exports
pub use bridge::{mask_to_polygons, persist_polygons, polygonize, rasterize, SubmissionAttributes};
pub use coco::{CocoFile, DatasetConfig};
