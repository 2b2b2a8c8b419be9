use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::coco::DatasetConfig;
use crate::error::{Error, Result};
use crate::triage::TriageDirs;

/// Environment variable naming the root working directory.
pub const ROOT_DIR_ENV: &str = "DIR";

/// What to do when a tile cannot be processed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OpenErrorPolicy {
    /// Stop the run and exit with status 1
    #[default]
    Abort,
    /// Log the tile as failed and continue with the next one
    Skip,
}

/// Build a COCO dataset from georeferenced tiles and ground-truth polygons.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct AnnotateArgs {
    /// Text file listing tile paths, one per line
    pub input_list: PathBuf,

    /// Directory receiving tiles that intersect at least one object
    pub output_with_objects: PathBuf,

    /// Directory receiving tiles without objects
    pub output_without_objects: PathBuf,

    /// Ground-truth vector datasource (e.g. a shapefile)
    pub ground_truth: PathBuf,

    /// COCO JSON document, rewritten after every tile with objects
    pub output_json: PathBuf,

    /// Behaviour when a tile cannot be opened or converted
    #[arg(long = "on-open-error", value_enum, default_value = "abort")]
    pub on_open_error: OpenErrorPolicy,

    /// Name of the single COCO category
    #[arg(long = "category-name", default_value = "kiln", value_parser = validate_name)]
    pub category_name: String,

    /// Name of the single COCO license
    #[arg(long = "license-name", default_value = "Swalim project", value_parser = validate_name)]
    pub license_name: String,
}

impl AnnotateArgs {
    pub fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            category_name: self.category_name.clone(),
            license_name: self.license_name.clone(),
            ..DatasetConfig::default()
        }
    }
}

/// Remove tiles without data and sort the others into panchromatic and RGB
/// folders. Defaults resolve under $DIR/inputs.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct TriageArgs {
    /// Text file listing tile paths [default: $DIR/inputs/list_tiles.csv]
    #[arg(long = "list")]
    pub list: Option<PathBuf>,

    /// Destination of single-band tiles [default: $DIR/inputs/Tiled/pancro/]
    #[arg(long = "pancro-dir")]
    pub pancro_dir: Option<PathBuf>,

    /// Destination of three-band tiles [default: $DIR/inputs/Tiled/RGB/]
    #[arg(long = "rgb-dir")]
    pub rgb_dir: Option<PathBuf>,

    /// Number of worker threads [default: available cores minus ten]
    #[arg(long = "workers", value_parser = validate_workers)]
    pub workers: Option<usize>,
}

impl TriageArgs {
    /// Fill unset paths from the root directory in `root`.
    pub fn resolve(&self, root: Option<PathBuf>) -> Result<(PathBuf, TriageDirs)> {
        let from_root = |explicit: &Option<PathBuf>, rel: &str| -> Result<PathBuf> {
            match (explicit, &root) {
                (Some(path), _) => Ok(path.clone()),
                (None, Some(root)) => Ok(root.join(rel)),
                (None, None) => Err(Error::Config(format!(
                    "${} is not set and no explicit path was given for {}",
                    ROOT_DIR_ENV, rel
                ))),
            }
        };
        let list = from_root(&self.list, "inputs/list_tiles.csv")?;
        let dirs = TriageDirs {
            pancro: from_root(&self.pancro_dir, "inputs/Tiled/pancro")?,
            rgb: from_root(&self.rgb_dir, "inputs/Tiled/RGB")?,
        };
        Ok((list, dirs))
    }
}

/// Turn a prediction mask into georeferenced polygons with probabilities.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct MaskArgs {
    /// Raster providing the geotransform and projection of the mask
    pub reference: PathBuf,

    /// Single-band mask raster; non-zero connected regions become polygons
    pub mask: PathBuf,

    /// Text file with one probability per region, in row-major order of
    /// each region's first pixel
    pub probabilities: PathBuf,

    /// Output vector datasource, appended to when it exists
    pub output: PathBuf,

    /// Value of the `submitname` attribute
    #[arg(long = "submit-name", default_value = "")]
    pub submit_name: String,

    /// Value of the `weightname` attribute
    #[arg(long = "weights-name", default_value = "")]
    pub weights_name: String,
}

/// Root working directory from the environment.
pub fn root_dir_from_env() -> Option<PathBuf> {
    std::env::var_os(ROOT_DIR_ENV).map(PathBuf::from)
}

// Names end up in the JSON header; reject blanks
fn validate_name(s: &str) -> std::result::Result<String, String> {
    if s.trim().is_empty() {
        Err("name must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn validate_workers(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("WORKERS must be a positive integer".to_string()),
    }
}
