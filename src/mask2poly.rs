use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use tiles2coco::{config::MaskArgs, run_mask};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = MaskArgs::parse();

    match run_mask(&args) {
        Ok(count) => {
            info!("{} polygons written to {}", count, args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Mask conversion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
