use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use tiles2coco::{config::AnnotateArgs, run_annotation};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = AnnotateArgs::parse();

    if !args.input_list.is_file() {
        error!(
            "The specified input list does not exist: {}",
            args.input_list.display()
        );
        return ExitCode::FAILURE;
    }

    info!("Starting tiles to COCO annotation...");

    match run_annotation(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!("Annotation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_resource_open() => {
            error!("Annotation aborted, an input could not be opened: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Annotation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
