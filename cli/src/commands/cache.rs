use anyhow::Result;
use popgrid::{AreaLevelId, PopulationId, RasterId};

use crate::cli::CacheCommand;

use super::{load_config, open_store};

pub fn run(cli: &crate::cli::Cli, command: &CacheCommand) -> Result<i32> {
    let config = load_config(cli)?;
    let mut store = open_store(cli, &config)?;

    match command {
        CacheCommand::List => {
            for entry in store.cache_entries()? {
                let state = if entry.up_to_date { "fresh" } else { "stale" };
                println!("{}\t{}\t{state}", entry.population, entry.level);
            }
        }
        CacheCommand::Invalidate(args) => {
            let changed = match (args.population, args.level, args.raster) {
                (_, _, Some(raster)) => store.invalidate_raster(RasterId(raster))?,
                (Some(population), Some(level), _) => store.invalidate(PopulationId(population), AreaLevelId(level))?,
                (Some(population), None, _) => store.invalidate_population(PopulationId(population))?,
                (None, Some(level), _) => store.invalidate_level(AreaLevelId(level))?,
                (None, None, None) => store.invalidate_all()?,
            };
            println!("[cache] {changed} entries marked stale");
        }
    }

    Ok(0)
}
