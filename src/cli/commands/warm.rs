//! Warm command - walk the whole tree into the cache

use crate::cli::args::WarmArgs;
use crate::cli::commands::{create_spinner, open_picker};
use crate::config::Config;
use crate::error::DrivepickResult;
use console::style;
use std::time::Instant;

/// Execute the warm command
pub async fn execute(args: WarmArgs, config: &Config) -> DrivepickResult<()> {
    let picker = open_picker(config).await?;

    let started = Instant::now();
    let spinner = create_spinner(if args.force {
        "Refetching every folder..."
    } else {
        "Walking folder tree..."
    });
    let result = picker.warm(args.force).await;
    spinner.finish_and_clear();
    let report = result?;

    println!(
        "{} Cached {} folders with {} files in {:.1}s",
        style("✓").green(),
        report.folders,
        report.files,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
