//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, ProviderKind};
use crate::error::{DrivepickError, DrivepickResult};
use console::style;
use std::path::PathBuf;

const VALID_KEYS: [&str; 22] = [
    "general.log_format",
    "general.history",
    "source.provider",
    "source.root_folder_id",
    "source.drive_id",
    "source.access_token_env",
    "source.local_root",
    "source.page_size",
    "source.timeout_secs",
    "cache.file",
    "cache.ttl_hours",
    "cache.stale_days",
    "cache.persist_every",
    "cache.walk_concurrency",
    "selection.max_attempts",
    "selection.supported_mime_types",
    "selection.video_mime_types",
    "selection.max_file_size_mb",
    "selection.max_video_secs",
    "selection.ffprobe",
    "download.dir",
    "download.keep",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> DrivepickResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> DrivepickResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> DrivepickResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}",
            style("!").yellow(),
            path.display()
        );
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> DrivepickResult<()> {
    let mut config = config.clone();

    if let Err(e) = apply_setting(&mut config, key, value) {
        if matches!(e, DrivepickError::User(ref m) if m.starts_with("Unknown config key")) {
            eprintln!("Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
        }
        return Err(e);
    }
    config.validate().map_err(DrivepickError::User)?;

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

/// Apply one dot-separated `key = value` setting
fn apply_setting(config: &mut Config, key: &str, value: &str) -> DrivepickResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),
        ["general", "history"] => config.general.history = parse_bool(value)?,

        ["source", "provider"] => config.source.provider = parse_provider(value)?,
        ["source", "root_folder_id"] => config.source.root_folder_id = parse_optional(value),
        ["source", "drive_id"] => config.source.drive_id = parse_optional(value),
        ["source", "access_token_env"] => config.source.access_token_env = value.to_string(),
        ["source", "local_root"] => {
            config.source.local_root = parse_optional(value).map(PathBuf::from)
        }
        ["source", "page_size"] => config.source.page_size = parse_num(value)?,
        ["source", "timeout_secs"] => config.source.timeout_secs = parse_num(value)?,

        ["cache", "file"] => config.cache.file = parse_optional(value).map(PathBuf::from),
        ["cache", "ttl_hours"] => config.cache.ttl_hours = parse_num(value)?,
        ["cache", "stale_days"] => config.cache.stale_days = parse_num(value)?,
        ["cache", "persist_every"] => config.cache.persist_every = parse_num(value)?,
        ["cache", "walk_concurrency"] => config.cache.walk_concurrency = parse_num(value)?,

        ["selection", "max_attempts"] => config.selection.max_attempts = parse_num(value)?,
        ["selection", "supported_mime_types"] => {
            config.selection.supported_mime_types = parse_list(value)
        }
        ["selection", "video_mime_types"] => config.selection.video_mime_types = parse_list(value),
        ["selection", "max_file_size_mb"] => {
            config.selection.max_file_size_mb = parse_optional(value)
                .map(|v| parse_num(&v))
                .transpose()?
        }
        ["selection", "max_video_secs"] => {
            config.selection.max_video_secs = parse_optional(value)
                .map(|v| parse_num(&v))
                .transpose()?
        }
        ["selection", "ffprobe"] => config.selection.ffprobe = value.to_string(),

        ["download", "dir"] => config.download.dir = parse_optional(value).map(PathBuf::from),
        ["download", "keep"] => config.download.keep = parse_num(value)?,

        _ => {
            return Err(DrivepickError::User(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    Ok(())
}

/// Empty or `none` clears an optional value
fn parse_optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_provider(value: &str) -> DrivepickResult<ProviderKind> {
    match value.to_lowercase().as_str() {
        "google" => Ok(ProviderKind::Google),
        "local" => Ok(ProviderKind::Local),
        _ => Err(DrivepickError::User(format!(
            "Invalid provider: {}. Use google/local",
            value
        ))),
    }
}

fn parse_bool(value: &str) -> DrivepickResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(DrivepickError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_num<T: std::str::FromStr>(value: &str) -> DrivepickResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DrivepickError::User(format!("Invalid number: {}", value)))
}
