use std::path::PathBuf;

use anyhow::Result;
use popgrid::{totals_by_area, write_csv, AgeGroupId, AreaLevelId, GenderId, PopulationId, RasterId, StratumFilter};

use crate::cli::{ExportCommand, StratumArgs};

use super::{load_config, open_store};

fn stratum_filter(args: &StratumArgs) -> StratumFilter {
    StratumFilter {
        age_groups: (!args.age_groups.is_empty()).then(|| args.age_groups.iter().copied().map(AgeGroupId).collect()),
        genders: (!args.genders.is_empty()).then(|| args.genders.iter().copied().map(GenderId).collect()),
    }
}

pub fn run(cli: &crate::cli::Cli, command: &ExportCommand) -> Result<i32> {
    let config = load_config(cli)?;
    let store = open_store(cli, &config)?;

    let (mut df, out_path) = match command {
        ExportCommand::Cells { population, strata, output } => (
            store.cell_population_frame(PopulationId(*population), &stratum_filter(strata))?,
            output.clone().unwrap_or_else(|| PathBuf::from("./cells.csv")),
        ),
        ExportCommand::Areas { population, level, strata, totals, output } => {
            let df = store.area_population_frame(PopulationId(*population), AreaLevelId(*level), &stratum_filter(strata))?;
            (
                if *totals { totals_by_area(&df)? } else { df },
                output.clone().unwrap_or_else(|| PathBuf::from("./areas.csv")),
            )
        }
        ExportCommand::Weights { level, raster, output } => (
            store.weights_frame(AreaLevelId(*level), RasterId(*raster))?,
            output.clone().unwrap_or_else(|| PathBuf::from("./weights.csv")),
        ),
    };

    log::info!("[export] writing {} rows to {}", df.height(), out_path.display());
    write_csv(&mut df, &out_path)?;
    println!("[export] {} rows written to {}", df.height(), out_path.display());

    Ok(0)
}
