//! Derived tables: the (area, cell) weight table and both stratified output tables.
//!
//! Each commit replaces a complete unit inside one transaction: the new rows are
//! computed in memory beforehand, so readers see either the old or the new state.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::{
    store::{cache, Store},
    types::{
        AgeGroupId, AreaId, AreaLevelId, AreaPopulation, CellPopulation, GenderId, Population, PopulationId,
        RasterId, Stratum,
    },
    weights::{AreaCellWeight, WeightSet},
};

/// Restricts output queries to some age groups and/or genders. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StratumFilter {
    pub age_groups: Option<Vec<AgeGroupId>>,
    pub genders: Option<Vec<GenderId>>,
}

impl StratumFilter {
    pub fn all() -> Self { Self::default() }

    pub fn matches(&self, stratum: &Stratum) -> bool {
        self.age_groups.as_ref().is_none_or(|ids| ids.contains(&stratum.age_group))
            && self.genders.as_ref().is_none_or(|ids| ids.contains(&stratum.gender))
    }
}

/// Replace all weight rows of the areas of `weights.level()` against `weights.raster()`.
fn replace_weights(conn: &Connection, weights: &WeightSet) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM area_cell_weight WHERE raster_id = ?1
         AND (area_level_id = ?2 OR area_id IN (SELECT id FROM area WHERE area_level_id = ?2))",
        params![weights.raster(), weights.level()],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO area_cell_weight (area_id, cell_id, area_level_id, raster_id, share_cell_of_area, share_area_of_cell)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    )?;
    for row in weights.rows() {
        stmt.execute(params![
            row.area, row.cell, weights.level(), weights.raster(), row.share_cell_of_area, row.share_area_of_cell,
        ])?;
    }
    Ok(weights.len())
}

impl Store {
    /// Persist a disaggregation: the weights it used and the full set of cell rows of
    /// the dataset. The cell rows become fresh; every stored aggregate of the dataset
    /// goes stale.
    pub fn commit_disaggregation(&mut self, population: &Population, weights: &WeightSet, rows: &[CellPopulation]) -> Result<usize> {
        let id = population.id;
        self.write_unit(&format!("disaggregation of {id}"), |tx| {
            replace_weights(tx, weights)?;

            tx.execute("DELETE FROM raster_cell_population_age_gender WHERE population_id = ?1", params![id])?;
            let mut stmt = tx.prepare(
                "INSERT INTO raster_cell_population_age_gender (population_id, cell_id, age_group_id, gender_id, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            )?;
            for row in rows {
                stmt.execute(params![id, row.cell, row.stratum.age_group, row.stratum.gender, row.value])?;
            }

            cache::invalidate_aggregates(tx, id)?;
            cache::mark_disaggregated(tx, id)?;
            Ok(rows.len())
        })
    }

    /// Persist an aggregation of `population` into `weights.level()` and mark it up to date.
    pub fn commit_aggregation(&mut self, population: &Population, weights: &WeightSet, rows: &[AreaPopulation]) -> Result<usize> {
        let (id, level) = (population.id, weights.level());
        self.write_unit(&format!("aggregation of {id} into {level}"), |tx| {
            replace_weights(tx, weights)?;

            tx.execute(
                "DELETE FROM area_population_age_gender WHERE population_id = ?1
                 AND (area_level_id = ?2 OR area_id IN (SELECT id FROM area WHERE area_level_id = ?2))",
                params![id, level],
            )?;
            let mut stmt = tx.prepare(
                "INSERT INTO area_population_age_gender (population_id, area_id, area_level_id, age_group_id, gender_id, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            )?;
            for row in rows {
                stmt.execute(params![id, row.area, level, row.stratum.age_group, row.stratum.gender, row.value])?;
            }

            cache::mark_up_to_date(tx, id, level)?;
            Ok(rows.len())
        })
    }

    /// The stored weight table of a (level, raster) pair.
    pub fn weights(&self, level: AreaLevelId, raster: RasterId) -> Result<WeightSet> {
        let mut stmt = self.conn.prepare(
            "SELECT area_id, cell_id, share_cell_of_area, share_area_of_cell FROM area_cell_weight
             WHERE area_level_id = ?1 AND raster_id = ?2 ORDER BY area_id, cell_id"
        )?;
        let rows = stmt.query_map(params![level, raster], |row| Ok(AreaCellWeight {
            area: row.get(0)?,
            cell: row.get(1)?,
            share_cell_of_area: row.get(2)?,
            share_area_of_cell: row.get(3)?,
        }))?.collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT a.id FROM area a WHERE a.area_level_id = ?1 AND NOT EXISTS (
                SELECT 1 FROM area_cell_weight w WHERE w.area_id = a.id AND w.raster_id = ?2)
             ORDER BY a.id"
        )?;
        let unlocated = stmt.query_map(params![level, raster], |row| row.get::<_, AreaId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(WeightSet::new(level, raster, rows, unlocated))
    }

    /// Disaggregated rows of a dataset, ordered by cell, then stratum.
    pub fn cell_population(&self, population: PopulationId, filter: &StratumFilter) -> Result<Vec<CellPopulation>> {
        let mut stmt = self.conn.prepare(
            "SELECT cell_id, age_group_id, gender_id, value FROM raster_cell_population_age_gender
             WHERE population_id = ?1 ORDER BY cell_id, age_group_id, gender_id"
        )?;
        let rows = stmt.query_map(params![population], |row| Ok(CellPopulation {
            cell: row.get(0)?,
            stratum: Stratum::new(row.get(1)?, row.get(2)?),
            value: row.get(3)?,
        }))?.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows.into_iter().filter(|row| filter.matches(&row.stratum)).collect())
    }

    /// Aggregated rows of a dataset at `level`, ordered by area, then stratum.
    pub fn area_population(&self, population: PopulationId, level: AreaLevelId, filter: &StratumFilter) -> Result<Vec<AreaPopulation>> {
        let mut stmt = self.conn.prepare(
            "SELECT area_id, age_group_id, gender_id, value FROM area_population_age_gender
             WHERE population_id = ?1 AND area_level_id = ?2 ORDER BY area_id, age_group_id, gender_id"
        )?;
        let rows = stmt.query_map(params![population, level], |row| Ok(AreaPopulation {
            area: row.get(0)?,
            stratum: Stratum::new(row.get(1)?, row.get(2)?),
            value: row.get(3)?,
        }))?.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows.into_iter().filter(|row| filter.matches(&row.stratum)).collect())
    }

    /// Total aggregated population of one area, over the strata matching `filter`.
    pub fn area_total(&self, population: PopulationId, area: AreaId, filter: &StratumFilter) -> Result<f64> {
        let mut stmt = self.conn.prepare(
            "SELECT age_group_id, gender_id, value FROM area_population_age_gender
             WHERE population_id = ?1 AND area_id = ?2"
        )?;
        let rows = stmt.query_map(params![population, area], |row| Ok((
            Stratum::new(row.get(0)?, row.get(1)?),
            row.get::<_, f64>(2)?,
        )))?.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows.into_iter().filter(|(stratum, _)| filter.matches(stratum)).map(|(_, value)| value).sum())
    }
}
