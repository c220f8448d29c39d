pub mod aggregate;
pub mod cache;
pub mod disaggregate;
pub mod export;

use anyhow::Result;
use popgrid::{Config, Store};

/// Configuration from `--config` (or defaults) with command-line overrides applied.
pub fn load_config(cli: &crate::cli::Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if cli.drop_indexes { config.drop_indexes = true; }
    Ok(config)
}

pub fn open_store(cli: &crate::cli::Cli, config: &Config) -> Result<Store> {
    log::debug!("[cli] opening {}", cli.db.display());
    Store::open(&cli.db, config)
}
