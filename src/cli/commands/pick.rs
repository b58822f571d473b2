//! Pick command - choose and download random media
//!
//! With `--count 0` or a count above one, picks repeat every `--interval`
//! seconds until done or interrupted with Ctrl-C.

use crate::cli::args::{OutputFormat, PickArgs};
use crate::cli::commands::open_picker;
use crate::config::{Config, ConfigManager};
use crate::downloads::RecentDownloads;
use crate::error::DrivepickResult;
use crate::history::PickHistory;
use crate::select::{PickedMedia, Picker};
use console::style;
use std::time::Duration;
use tracing::info;

/// Execute the pick command
pub async fn execute(args: PickArgs, config: &Config) -> DrivepickResult<()> {
    let picker = open_picker(config).await?;
    let history = PickHistory::new(config);
    let mut downloads =
        RecentDownloads::open(&ConfigManager::download_dir(config), config.download.keep).await?;

    tokio::select! {
        result = pick_loop(&picker, &args, &history, &mut downloads) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
            eprintln!("Interrupted.");
            Ok(())
        }
    }
}

async fn pick_loop(
    picker: &Picker,
    args: &PickArgs,
    history: &PickHistory,
    downloads: &mut RecentDownloads,
) -> DrivepickResult<()> {
    let mut done = 0u32;
    loop {
        let picked = picker.pick_media().await?;
        history.record(&picked).await;
        downloads.push(picked.local_path.clone()).await;
        print_pick(&picked, args.format)?;

        done += 1;
        if args.count != 0 && done >= args.count {
            return Ok(());
        }
        if args.interval > 0 {
            tokio::time::sleep(Duration::from_secs(args.interval)).await;
        }
    }
}

fn print_pick(picked: &PickedMedia, format: OutputFormat) -> DrivepickResult<()> {
    match format {
        OutputFormat::Table => {
            println!("{} {}", style("✓").green(), style(&picked.path).bold());
            println!("  {:<10} {}", "id", picked.file.id);
            println!("  {:<10} {}", "type", picked.file.mime_type);
            if let Some(size) = picked.file.size {
                println!("  {:<10} {}", "size", format_size(size));
            }
            println!("  {:<10} {}", "file", picked.local_path.display());
            println!("  {:<10} {}", "attempts", picked.attempts);
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "id": picked.file.id,
                "path": picked.path,
                "mime_type": picked.file.mime_type,
                "size": picked.file.size,
                "local_path": picked.local_path,
                "attempts": picked.attempts,
            });
            println!("{}", serde_json::to_string(&json)?);
        }
        OutputFormat::Plain => println!("{}", picked.local_path.display()),
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
