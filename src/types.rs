// Struct to hold annotation run statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub tiles_listed: usize,
    pub with_objects: usize,
    pub without_objects: usize,
    pub skipped_not_tiff: usize,
    pub failed: usize,
    pub annotations: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_summary(&self) {
        log::info!("=== Annotation Summary ===");
        log::info!("Tiles listed: {}", self.tiles_listed);
        log::info!("Tiles with objects: {}", self.with_objects);
        log::info!("Tiles without objects: {}", self.without_objects);
        log::info!("Annotations written: {}", self.annotations);
        if self.skipped_not_tiff > 0 {
            log::warn!("Skipped (not a GeoTIFF): {}", self.skipped_not_tiff);
        }
        if self.failed > 0 {
            log::warn!("Failed tiles: {}", self.failed);
        }
    }
}

// Struct to hold triage statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriageStats {
    pub removed_empty: usize,
    pub moved_pancro: usize,
    pub moved_rgb: usize,
    pub unexpected_bands: usize,
    pub missing: usize,
    pub failed: usize,
}

impl TriageStats {
    pub fn print_summary(&self) {
        log::info!("=== Triage Summary ===");
        log::info!("Removed (no data): {}", self.removed_empty);
        log::info!("Moved to pancro: {}", self.moved_pancro);
        log::info!("Moved to RGB: {}", self.moved_rgb);
        if self.unexpected_bands > 0 {
            log::warn!("Left in place (unexpected band count): {}", self.unexpected_bands);
        }
        if self.missing > 0 {
            log::warn!("Listed but missing: {}", self.missing);
        }
        if self.failed > 0 {
            log::warn!("Failed: {}", self.failed);
        }
    }
}
