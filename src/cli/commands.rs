//! CLI command implementations.

use std::path::{Path, PathBuf};

use crate::cache::RecencyCache;
use crate::replay::Replayer;
use crate::types::config::{Config, OverwritePolicy, DEFAULT_CONFIG_FILE};
use crate::CacheResult;

/// Writes a default configuration file into `path` (or the current
/// directory). An existing file is left alone.
pub fn init(path: Option<PathBuf>) -> CacheResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(DEFAULT_CONFIG_FILE);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default_config().save(&config_path)?;

    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust [cache] capacity and policy");
    println!("  2. Run a script: recency-cache replay <script>");

    Ok(())
}

/// Runs an operation script and prints the report.
pub fn replay(
    script: &Path,
    capacity: Option<usize>,
    policy: Option<OverwritePolicy>,
    json: bool,
    config: &Config,
) -> CacheResult<()> {
    let capacity = match capacity {
        Some(capacity) => capacity,
        None => config.cache.validate()?,
    };
    let policy = policy.unwrap_or(config.cache.policy);

    tracing::debug!(
        script = %script.display(),
        capacity,
        %policy,
        "Replaying script"
    );

    let source = std::fs::read_to_string(script)?;
    let cache = RecencyCache::with_policy(capacity, policy);
    let report = Replayer::run_source(cache, &source)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}

/// Prints the effective configuration as TOML.
pub fn config_cmd(config_path: &Path, config: &Config) -> CacheResult<()> {
    if config_path.exists() {
        println!("# Loaded from {}", config_path.display());
    } else {
        println!("# {} not found, showing defaults", config_path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Shows version.
pub fn version() {
    println!("recency-cache v{}", env!("CARGO_PKG_VERSION"));
}
