//! Empty-tile triage: drop tiles without data and sort the rest by band
//! count.
//!
//! Each tile is handled independently on a bounded rayon pool. A failing tile
//! is logged and counted; it never stops the others.

use log::{error, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::io::{move_tile_into, remove_tile};
use crate::raster::Raster;
use crate::types::TriageStats;
use crate::utils::create_progress_bar;

/// Destinations of tiles that hold data.
#[derive(Debug, Clone)]
pub struct TriageDirs {
    /// Single-band (panchromatic) tiles.
    pub pancro: PathBuf,
    /// Three-band tiles.
    pub rgb: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriageAction {
    RemovedEmpty,
    MovedPancro(PathBuf),
    MovedRgb(PathBuf),
    UnexpectedBands(usize),
    Missing,
}

/// Inspect one tile and delete, move or keep it.
///
/// A tile is empty when both the summed band minima and the summed band
/// maxima are zero, nodata pixels excluded; it is removed together with its
/// sidecars.
pub fn triage_tile(path: &Path, dirs: &TriageDirs) -> Result<TriageAction> {
    if !path.is_file() {
        return Ok(TriageAction::Missing);
    }

    let (bands, min_sum, max_sum) = {
        let raster = Raster::open(path)?;
        let stats = raster.band_min_max()?;
        // bands without statistics add nothing
        let min_sum: f64 = stats.iter().flatten().map(|(min, _)| min).sum();
        let max_sum: f64 = stats.iter().flatten().map(|(_, max)| max).sum();
        (stats.len(), min_sum, max_sum)
    };

    if min_sum == 0.0 && max_sum == 0.0 {
        remove_tile(path)?;
        info!("File {} removed. No data on the raster", path.display());
        return Ok(TriageAction::RemovedEmpty);
    }

    match bands {
        1 => Ok(TriageAction::MovedPancro(move_tile_into(path, &dirs.pancro)?)),
        3 => Ok(TriageAction::MovedRgb(move_tile_into(path, &dirs.rgb)?)),
        other => {
            warn!("{} has {} bands; leaving it in place", path.display(), other);
            Ok(TriageAction::UnexpectedBands(other))
        }
    }
}

/// Triage every path on a pool of `workers` threads.
pub fn triage_tiles(paths: &[PathBuf], dirs: &TriageDirs, workers: usize) -> Result<TriageStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| Error::Config(format!("cannot build worker pool: {e}")))?;
    info!("Triaging {} tiles on {} workers", paths.len(), workers.max(1));

    let pb = create_progress_bar(paths.len() as u64, "Triage");
    let results: Vec<Result<TriageAction>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let result = triage_tile(path, dirs);
                if let Err(e) = &result {
                    error!("Failed to triage {}: {}", path.display(), e);
                }
                pb.inc(1);
                result
            })
            .collect()
    });
    pb.finish();

    let mut stats = TriageStats::default();
    for result in results {
        match result {
            Ok(TriageAction::RemovedEmpty) => stats.removed_empty += 1,
            Ok(TriageAction::MovedPancro(_)) => stats.moved_pancro += 1,
            Ok(TriageAction::MovedRgb(_)) => stats.moved_rgb += 1,
            Ok(TriageAction::UnexpectedBands(_)) => stats.unexpected_bands += 1,
            Ok(TriageAction::Missing) => stats.missing += 1,
            Err(_) => stats.failed += 1,
        }
    }
    Ok(stats)
}
