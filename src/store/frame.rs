use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{io::SerWriter, prelude::*};

use crate::{
    store::{Store, StratumFilter},
    types::{AreaLevelId, PopulationId, RasterId},
};

impl Store {
    /// Disaggregated rows of a dataset as a DataFrame:
    /// `cell_id, age_group_id, gender_id, value`.
    pub fn cell_population_frame(&self, population: PopulationId, filter: &StratumFilter) -> Result<DataFrame> {
        let rows = self.cell_population(population, filter)?;
        Ok(DataFrame::new(vec![
            Column::new("cell_id".into(), rows.iter().map(|r| r.cell.0).collect::<Vec<_>>()),
            Column::new("age_group_id".into(), rows.iter().map(|r| r.stratum.age_group.0).collect::<Vec<_>>()),
            Column::new("gender_id".into(), rows.iter().map(|r| r.stratum.gender.0).collect::<Vec<_>>()),
            Column::new("value".into(), rows.iter().map(|r| r.value).collect::<Vec<_>>()),
        ])?)
    }

    /// Aggregated rows of a dataset at `level` as a DataFrame:
    /// `area_id, age_group_id, gender_id, value`.
    pub fn area_population_frame(&self, population: PopulationId, level: AreaLevelId, filter: &StratumFilter) -> Result<DataFrame> {
        let rows = self.area_population(population, level, filter)?;
        Ok(DataFrame::new(vec![
            Column::new("area_id".into(), rows.iter().map(|r| r.area.0).collect::<Vec<_>>()),
            Column::new("age_group_id".into(), rows.iter().map(|r| r.stratum.age_group.0).collect::<Vec<_>>()),
            Column::new("gender_id".into(), rows.iter().map(|r| r.stratum.gender.0).collect::<Vec<_>>()),
            Column::new("value".into(), rows.iter().map(|r| r.value).collect::<Vec<_>>()),
        ])?)
    }

    /// Stored weight table of a (level, raster) pair as a DataFrame.
    pub fn weights_frame(&self, level: AreaLevelId, raster: RasterId) -> Result<DataFrame> {
        let weights = self.weights(level, raster)?;
        let rows = weights.rows();
        Ok(DataFrame::new(vec![
            Column::new("area_id".into(), rows.iter().map(|r| r.area.0).collect::<Vec<_>>()),
            Column::new("cell_id".into(), rows.iter().map(|r| r.cell.0).collect::<Vec<_>>()),
            Column::new("share_cell_of_area".into(), rows.iter().map(|r| r.share_cell_of_area).collect::<Vec<_>>()),
            Column::new("share_area_of_cell".into(), rows.iter().map(|r| r.share_area_of_cell).collect::<Vec<_>>()),
        ])?)
    }
}

/// Per-area totals over all strata of an aggregated frame, sorted by area.
pub fn totals_by_area(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.clone().lazy()
        .group_by([col("area_id")])
        .agg([col("value").sum().alias("value")])
        .sort(["area_id"], SortMultipleOptions::default())
        .collect()?)
}

/// Writes a DataFrame to a CSV file at `path`.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("[store::frame] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("[store::frame] Failed to write CSV to {}", path.display()))?;
    Ok(())
}
