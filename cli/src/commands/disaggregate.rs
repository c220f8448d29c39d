use anyhow::Result;
use popgrid::{disaggregate_all, run_unit, PopulationId, Unit};

use super::{load_config, open_store};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::DisaggregateArgs) -> Result<i32> {
    let config = load_config(cli)?;
    let mut store = open_store(cli, &config)?;

    let summary = match args.population {
        Some(id) if !args.all => run_unit(&mut store, &config, Unit::Disaggregate(PopulationId(id)))?,
        _ => disaggregate_all(&mut store, &config)?,
    };

    print!("{summary}");
    Ok(summary.status().code())
}
