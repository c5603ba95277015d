use anyhow::Context;
use clap::Parser;
use recency_cache::cli::{Cli, Commands};
use recency_cache::types::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config)
            .with_context(|| format!("failed to load {}", cli.config.display()))?
    } else {
        Config::default_config()
    };
    config.general.validate().context("invalid [general] section")?;

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("recency_cache={}", log_level)
            .parse()
            .context("invalid log level")?,
    );

    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt_layer.json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            recency_cache::cli::commands::init(path)?;
        }
        Commands::Replay {
            script,
            capacity,
            policy,
            json,
        } => {
            recency_cache::cli::commands::replay(&script, capacity, policy, json, &config)
                .with_context(|| format!("replay of {} failed", script.display()))?;
        }
        Commands::Config => {
            recency_cache::cli::commands::config_cmd(&cli.config, &config)?;
        }
        Commands::Version => {
            recency_cache::cli::commands::version();
        }
    }

    Ok(())
}
