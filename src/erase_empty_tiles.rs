use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use tiles2coco::{
    config::{root_dir_from_env, TriageArgs},
    run_triage,
};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = TriageArgs::parse();

    info!("Starting empty tile triage...");

    match run_triage(&args, root_dir_from_env()) {
        Ok(stats) => {
            stats.print_summary();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Triage failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
