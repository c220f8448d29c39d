use anyhow::Result;
use popgrid::{aggregate_all, aggregate_stale, run_unit, AreaLevelId, PopulationId, Unit};

use super::{load_config, open_store};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::AggregateArgs) -> Result<i32> {
    let config = load_config(cli)?;
    let mut store = open_store(cli, &config)?;

    let summary = match (args.population, args.level) {
        _ if args.stale => aggregate_stale(&mut store, &config)?,
        (Some(population), Some(level)) if !args.all => {
            run_unit(&mut store, &config, Unit::Aggregate(PopulationId(population), AreaLevelId(level)))?
        }
        _ => aggregate_all(&mut store, &config)?,
    };

    print!("{summary}");
    Ok(summary.status().code())
}
