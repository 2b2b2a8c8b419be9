use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory unless it already exists. Existing content is
/// kept: tiles from earlier runs may already live there.
pub fn ensure_directory(path: &Path) -> std::io::Result<()> {
    if !path.is_dir() {
        log::info!("Creating directory {}", path.display());
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Worker count used by the triage pool when none is given: all cores but
/// ten, never fewer than one.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(10)
        .max(1)
}
