//! Advisory freshness flags for stored outputs.
//!
//! Two kinds of flag live here: one per (dataset, area level) for aggregates, and
//! one per dataset for its disaggregated cell rows. A flag is set only by the
//! successful run that writes the matching rows, in the same transaction. It goes
//! stale only through the explicit invalidation calls below; nothing invalidates
//! it implicitly.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    store::Store,
    types::{AreaLevelId, PopulationId, RasterId},
};

/// Freshness of the stored aggregate of one dataset at one area level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationCacheEntry {
    pub population: PopulationId,
    pub level: AreaLevelId,
    pub up_to_date: bool,
}

pub(super) fn mark_up_to_date(conn: &Connection, population: PopulationId, level: AreaLevelId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO aggregation_cache (population_id, area_level_id, up_to_date) VALUES (?1, ?2, 1)
         ON CONFLICT (population_id, area_level_id) DO UPDATE SET up_to_date = 1",
        params![population, level],
    )?;
    Ok(())
}

pub(super) fn mark_disaggregated(conn: &Connection, population: PopulationId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO disaggregation_state (population_id, up_to_date) VALUES (?1, 1)
         ON CONFLICT (population_id) DO UPDATE SET up_to_date = 1",
        params![population],
    )?;
    Ok(())
}

pub(super) fn invalidate(conn: &Connection, population: PopulationId, level: AreaLevelId) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE aggregation_cache SET up_to_date = 0 WHERE population_id = ?1 AND area_level_id = ?2",
        params![population, level],
    )
}

/// Aggregates of a dataset at every level. Its cell rows stay trusted.
pub(super) fn invalidate_aggregates(conn: &Connection, population: PopulationId) -> rusqlite::Result<usize> {
    conn.execute("UPDATE aggregation_cache SET up_to_date = 0 WHERE population_id = ?1", params![population])
}

/// Cell rows and every aggregate of a dataset.
pub(super) fn invalidate_population(conn: &Connection, population: PopulationId) -> rusqlite::Result<usize> {
    conn.execute("UPDATE disaggregation_state SET up_to_date = 0 WHERE population_id = ?1", params![population])?;
    invalidate_aggregates(conn, population)
}

/// Aggregates at `level`, plus everything derived from datasets collected at `level`.
pub(super) fn invalidate_level(conn: &Connection, level: AreaLevelId) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE disaggregation_state SET up_to_date = 0
         WHERE population_id IN (SELECT id FROM population WHERE area_level_id = ?1)",
        params![level],
    )?;
    conn.execute(
        "UPDATE aggregation_cache SET up_to_date = 0
         WHERE area_level_id = ?1 OR population_id IN (SELECT id FROM population WHERE area_level_id = ?1)",
        params![level],
    )
}

/// Everything derived from datasets disaggregated onto `raster`.
pub(super) fn invalidate_raster(conn: &Connection, raster: RasterId) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE disaggregation_state SET up_to_date = 0
         WHERE population_id IN (SELECT id FROM population WHERE raster_id = ?1)",
        params![raster],
    )?;
    conn.execute(
        "UPDATE aggregation_cache SET up_to_date = 0
         WHERE population_id IN (SELECT id FROM population WHERE raster_id = ?1)",
        params![raster],
    )
}

impl Store {
    /// True only if the stored aggregate of `population` at `level` may be trusted as is.
    pub fn is_up_to_date(&self, population: PopulationId, level: AreaLevelId) -> Result<bool> {
        let flag: Option<bool> = self.conn.query_row(
            "SELECT up_to_date FROM aggregation_cache WHERE population_id = ?1 AND area_level_id = ?2",
            params![population, level],
            |row| row.get(0),
        ).optional()?;
        Ok(flag.unwrap_or(false))
    }

    /// True only if the stored cell rows of `population` reflect its current inputs.
    pub fn is_disaggregation_up_to_date(&self, population: PopulationId) -> Result<bool> {
        let flag: Option<bool> = self.conn.query_row(
            "SELECT up_to_date FROM disaggregation_state WHERE population_id = ?1",
            params![population],
            |row| row.get(0),
        ).optional()?;
        Ok(flag.unwrap_or(false))
    }

    pub fn mark_up_to_date(&mut self, population: PopulationId, level: AreaLevelId) -> Result<()> {
        Ok(mark_up_to_date(&self.conn, population, level)?)
    }

    pub fn invalidate(&mut self, population: PopulationId, level: AreaLevelId) -> Result<usize> {
        Ok(invalidate(&self.conn, population, level)?)
    }

    /// Marks the cell rows and every aggregate of `population` stale.
    /// Returns the number of aggregate entries touched.
    pub fn invalidate_population(&mut self, population: PopulationId) -> Result<usize> {
        Ok(invalidate_population(&self.conn, population)?)
    }

    /// Call after editing areas of `level` outside this store's mutators.
    pub fn invalidate_level(&mut self, level: AreaLevelId) -> Result<usize> {
        Ok(invalidate_level(&self.conn, level)?)
    }

    /// Call after changing cells or census values of `raster` outside this store's mutators.
    pub fn invalidate_raster(&mut self, raster: RasterId) -> Result<usize> {
        Ok(invalidate_raster(&self.conn, raster)?)
    }

    pub fn invalidate_all(&mut self) -> Result<usize> {
        self.conn.execute("UPDATE disaggregation_state SET up_to_date = 0", [])?;
        Ok(self.conn.execute("UPDATE aggregation_cache SET up_to_date = 0", [])?)
    }

    /// All aggregate cache entries, ordered by dataset, then level.
    pub fn cache_entries(&self) -> Result<Vec<AggregationCacheEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT population_id, area_level_id, up_to_date FROM aggregation_cache ORDER BY population_id, area_level_id"
        )?;
        let entries = stmt.query_map([], |row| Ok(AggregationCacheEntry {
            population: row.get(0)?,
            level: row.get(1)?,
            up_to_date: row.get(2)?,
        }))?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
