//! Weights command - show the top-level distribution

use crate::cli::args::{OutputFormat, WeightsArgs};
use crate::cli::commands::open_picker;
use crate::config::Config;
use crate::error::DrivepickResult;
use crate::select::Distribution;

/// Execute the weights command
pub async fn execute(args: WeightsArgs, config: &Config) -> DrivepickResult<()> {
    let picker = open_picker(config).await?;
    let distribution = picker.distribution().await?;

    if distribution.is_empty() {
        println!("No top-level folders below {}.", picker.root_id());
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&distribution),
        OutputFormat::Json => print_json(&distribution)?,
        OutputFormat::Plain => print_plain(&distribution),
    }
    Ok(())
}

fn share(weight: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        weight as f64 * 100.0 / total as f64
    }
}

fn print_table(distribution: &Distribution) {
    let total = distribution.total();
    println!("{:<32} {:<36} {:>8} {:>7}", "FOLDER", "ID", "FILES", "SHARE");
    println!("{}", "-".repeat(86));

    for entry in distribution.iter() {
        println!(
            "{:<32} {:<36} {:>8} {:>6.1}%",
            entry.name,
            entry.id,
            entry.weight,
            share(entry.weight, total)
        );
    }

    println!();
    println!("Total: {} files in {} folder(s)", total, distribution.len());
}

fn print_json(distribution: &Distribution) -> DrivepickResult<()> {
    #[derive(serde::Serialize)]
    struct WeightJson<'a> {
        id: &'a str,
        name: &'a str,
        weight: u64,
        share: f64,
    }

    let total = distribution.total();
    let entries: Vec<WeightJson> = distribution
        .iter()
        .map(|e| WeightJson {
            id: &e.id,
            name: &e.name,
            weight: e.weight,
            share: share(e.weight, total) / 100.0,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_plain(distribution: &Distribution) {
    for entry in distribution.iter() {
        println!("{}\t{}", entry.weight, entry.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_of_empty_total_is_zero() {
        assert_eq!(share(0, 0), 0.0);
        assert_eq!(share(3, 4), 75.0);
    }
}
