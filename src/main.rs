use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use directories::ProjectDirs;
use meridian::cli::{self, Cli, Commands};
use meridian_config::Config;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "meridian=debug";

fn main() -> anyhow::Result<()> {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();

    let (path, explicit) = match cli.config {
        Some(path) => (Some(path), true),
        None => (default_config_path(), false),
    };

    let config = match path {
        Some(path) if explicit || path.exists() => match Config::load(&path) {
            Ok(config) => config,
            Err(err) => {
                if matches!(cli.command, Commands::Validate) || explicit {
                    return Err(anyhow!("{err:?}"));
                }

                warn!("{err:?}");
                Config::default()
            }
        },
        Some(path) => {
            debug!("{path:?} doesn't exist, using the default config");
            Config::default()
        }
        None => {
            info!("no config directory, using the default config");
            Config::default()
        }
    };

    cli::run(cli.command, &config)
}

fn default_config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "meridian")?;
    Some(dirs.config_dir().join("config.kdl"))
}
