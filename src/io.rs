use log::{info, warn};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::annotate::{TileClass, TileRouter};

/// Read a list of paths, one per line. Blank lines are dropped, duplicates
/// removed and the result sorted so id assignment is reproducible.
pub fn read_path_list(list: &Path) -> std::io::Result<Vec<PathBuf>> {
    let reader = BufReader::new(File::open(list)?);
    let mut paths = BTreeSet::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            paths.insert(PathBuf::from(trimmed));
        }
    }
    Ok(paths.into_iter().collect())
}

/// Parse one probability per line, skipping blank lines.
pub fn read_probabilities(path: &Path) -> std::io::Result<Vec<f64>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>().map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid probability '{}': {}", line, e),
                )
            })
        })
        .collect()
}

/// True for GeoTIFF file names.
pub fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// World-file sidecar of a raster (`tile.tif` -> `tile.tfw`).
pub fn world_file_for(path: &Path) -> PathBuf {
    path.with_extension("tfw")
}

/// Auxiliary metadata GDAL writes next to a raster when it caches
/// statistics (`tile.tif` -> `tile.tif.aux.xml`).
pub fn aux_file_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".aux.xml");
    PathBuf::from(name)
}

/// Move `path` into `dir`, keeping its file name. Falls back to copy and
/// remove when a rename crosses filesystems.
pub fn move_into(path: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid file name: {:?}", path),
        )
    })?;
    let dest = dir.join(file_name);
    if fs::rename(path, &dest).is_err() {
        fs::copy(path, &dest)?;
        fs::remove_file(path)?;
    }
    Ok(dest)
}

/// Move a raster and, when present, its world-file and aux sidecars into
/// `dir`.
pub fn move_tile_into(path: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let dest = move_into(path, dir)?;
    for sidecar in [world_file_for(path), aux_file_for(path)] {
        if sidecar.exists() {
            move_into(&sidecar, dir)?;
        }
    }
    info!("Moved {} to {}", path.display(), dir.display());
    Ok(dest)
}

/// Delete a raster, its world-file sidecar and any aux metadata.
pub fn remove_tile(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)?;
    let sidecar = world_file_for(path);
    match fs::remove_file(&sidecar) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("No world file {} to remove", sidecar.display());
        }
        Err(e) => return Err(e),
    }
    let aux = aux_file_for(path);
    if aux.exists() {
        fs::remove_file(&aux)?;
    }
    Ok(())
}

/// Routes tiles by moving them into the "with objects" or "without objects"
/// directory.
#[derive(Debug, Clone)]
pub struct MoveRouter {
    pub with_objects: PathBuf,
    pub without_objects: PathBuf,
}

impl TileRouter for MoveRouter {
    fn route(&self, tile: &Path, class: TileClass) -> std::io::Result<()> {
        let dir = match class {
            TileClass::WithObjects => &self.with_objects,
            TileClass::WithoutObjects => &self.without_objects,
        };
        move_tile_into(tile, dir).map(|_| ())
    }
}
