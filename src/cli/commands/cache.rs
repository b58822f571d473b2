//! Cache command - inspect or maintain the folder cache

use crate::cache::{CachePolicy, CacheStats, FolderCache};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::cli::commands::open_cache;
use crate::config::{Config, ConfigManager};
use crate::error::DrivepickResult;
use chrono::{DateTime, Utc};
use console::style;
use std::io::{self, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DrivepickResult<()> {
    match args.action {
        CacheAction::Info => show_info(config).await,
        CacheAction::Prune => prune(config).await,
        CacheAction::Clear { yes } => clear(config, yes).await,
    }
}

async fn show_info(config: &Config) -> DrivepickResult<()> {
    let path = ConfigManager::cache_file_path(config);
    let policy = CachePolicy::from_config(&config.cache);
    let stats = FolderCache::inspect(&path, policy).await?;

    println!("Cache: {}", path.display());
    println!(
        "TTL: {} hours, stale after {} days",
        config.cache.ttl_hours, config.cache.stale_days
    );
    println!();
    print_stats(&stats, Utc::now());
    Ok(())
}

fn print_stats(stats: &CacheStats, now: DateTime<Utc>) {
    println!("  {:<10} {}", "folders", stats.entries);
    println!("  {:<10} {}", "fresh", style(stats.fresh).green());
    println!("  {:<10} {}", "expired", style(stats.expired).yellow());
    println!("  {:<10} {}", "stale", style(stats.stale).red());
    println!("  {:<10} {}", "files", stats.files);
    if let Some(oldest) = stats.oldest {
        println!(
            "  {:<10} {} ({} days ago)",
            "oldest",
            oldest.format("%Y-%m-%d %H:%M"),
            (now - oldest).num_days()
        );
    }
}

/// Opening the cache runs the stale sweep
async fn prune(config: &Config) -> DrivepickResult<()> {
    let path = ConfigManager::cache_file_path(config);
    let before = FolderCache::inspect(&path, CachePolicy::from_config(&config.cache)).await?;
    let (_, cache) = open_cache(config).await?;
    let remaining = cache.stats().await.entries;

    println!(
        "{} Dropped {} stale entries, {} remain",
        style("✓").green(),
        before.entries.saturating_sub(remaining),
        remaining
    );
    Ok(())
}

async fn clear(config: &Config, skip_confirm: bool) -> DrivepickResult<()> {
    let path = ConfigManager::cache_file_path(config);
    let stats = FolderCache::inspect(&path, CachePolicy::from_config(&config.cache)).await?;

    if stats.entries == 0 {
        println!("Cache is already empty.");
        return Ok(());
    }

    if !skip_confirm {
        print!(
            "This will forget {} cached folders. Are you sure? [y/N] ",
            stats.entries
        );
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let (_, cache) = open_cache(config).await?;
    let removed = cache.clear().await?;
    println!("{} Cleared {} cached folders", style("✓").green(), removed);
    Ok(())
}
