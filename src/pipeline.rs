//! End-to-end runs behind the command-line tools.

use log::{error, info, warn};
use std::path::PathBuf;

use crate::annotate::{AnnotationSession, TileOutcome};
use crate::bridge::{mask_to_polygons, SubmissionAttributes};
use crate::config::{AnnotateArgs, MaskArgs, OpenErrorPolicy, TriageArgs};
use crate::error::{Error, Result};
use crate::io::{is_tiff, read_path_list, read_probabilities, MoveRouter};
use crate::raster;
use crate::triage::triage_tiles;
use crate::types::{RunStats, TriageStats};
use crate::utils::{create_progress_bar, default_worker_count, ensure_directory};
use crate::vector::{AccessMode, VectorLayer};

/// Annotate every listed tile against the ground truth and write the COCO
/// document.
///
/// The document is rewritten after every tile with objects and once more at
/// the end, so a run where no tile holds objects still leaves a valid file.
pub fn run_annotation(args: &AnnotateArgs) -> Result<RunStats> {
    let listed = read_path_list(&args.input_list)?;
    let mut stats = RunStats::new();
    stats.tiles_listed = listed.len();

    let tiles: Vec<_> = listed
        .into_iter()
        .filter(|path| {
            let keep = is_tiff(path);
            if !keep {
                warn!("Skipping {}: not a GeoTIFF", path.display());
            }
            keep
        })
        .collect();
    stats.skipped_not_tiff = stats.tiles_listed - tiles.len();

    ensure_directory(&args.output_with_objects)?;
    ensure_directory(&args.output_without_objects)?;

    let mut ground_truth = VectorLayer::open(&args.ground_truth, AccessMode::ReadOnly)?;
    info!(
        "Ground truth {} opened, {} tiles to process",
        args.ground_truth.display(),
        tiles.len()
    );

    let router = MoveRouter {
        with_objects: args.output_with_objects.clone(),
        without_objects: args.output_without_objects.clone(),
    };
    let mut session = AnnotationSession::new(args.dataset_config());

    let pb = create_progress_bar(tiles.len() as u64, "Tiles");
    for tile in &tiles {
        match session.process_tile(tile, &mut ground_truth, &router, &args.output_json) {
            Ok(TileOutcome::WithObjects { annotations, .. }) => {
                stats.with_objects += 1;
                stats.annotations += annotations;
            }
            Ok(TileOutcome::WithoutObjects) => stats.without_objects += 1,
            Err(e) => match args.on_open_error {
                OpenErrorPolicy::Abort => {
                    pb.abandon();
                    error!("Aborting on {}: {}", tile.display(), e);
                    return Err(e);
                }
                OpenErrorPolicy::Skip => {
                    warn!("Skipping {}: {}", tile.display(), e);
                    stats.failed += 1;
                }
            },
        }
        pb.inc(1);
    }
    pb.finish_with_message("Annotation complete");

    session.write_checkpoint(&args.output_json)?;
    info!(
        "Wrote {} images and {} annotations to {}",
        session.images().len(),
        session.annotations().len(),
        args.output_json.display()
    );
    Ok(stats)
}

/// Remove empty tiles and sort the others by band count.
pub fn run_triage(args: &TriageArgs, root: Option<PathBuf>) -> Result<TriageStats> {
    let (list, dirs) = args.resolve(root)?;
    let tiles = read_path_list(&list)?;
    ensure_directory(&dirs.pancro)?;
    ensure_directory(&dirs.rgb)?;

    let workers = args.workers.unwrap_or_else(default_worker_count);
    triage_tiles(&tiles, &dirs, workers)
}

/// Polygonize a prediction mask and append the regions to the output layer.
pub fn run_mask(args: &MaskArgs) -> Result<usize> {
    let (mask, _, _, _) = raster::read_array::<u16>(&args.mask)?;
    if mask.shape.bands == 0 {
        return Err(Error::Raster(format!(
            "{} has no raster band",
            args.mask.display()
        )));
    }
    if mask.shape.bands != 1 {
        warn!(
            "{} has {} bands; only the first is polygonized",
            args.mask.display(),
            mask.shape.bands
        );
    }
    let probabilities = read_probabilities(&args.probabilities)?;
    let attributes = SubmissionAttributes {
        submit_name: args.submit_name.clone(),
        weight_name: args.weights_name.clone(),
    };
    mask_to_polygons(
        &args.reference,
        mask.band(0),
        mask.shape.width,
        mask.shape.height,
        &attributes,
        &probabilities,
        &args.output,
    )
}
