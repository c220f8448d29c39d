//! Input tables, written by external collaborators (raster import, area editing,
//! population import). Every mutator that can change weights, cell rows or aggregates calls
//! the matching cache invalidation inside its own transaction.

use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use geo::{Centroid, MultiPolygon, Point};
use rusqlite::{params, OptionalExtension};

use crate::{
    geom::{multipolygon_from_geojson, multipolygon_to_geojson},
    store::{cache, Store},
    types::{
        AgeGroupId, Area, AreaId, AreaLevelId, CellId, CensusCell, GenderId, Population, PopulationEntry,
        PopulationId, RasterCell, RasterId, Stratum,
    },
};

impl Store {
    pub fn add_raster(&mut self, name: &str) -> Result<RasterId> {
        self.conn.execute("INSERT INTO raster (name) VALUES (?1)", params![name])?;
        Ok(RasterId(self.conn.last_insert_rowid()))
    }

    pub fn rasters(&self) -> Result<Vec<(RasterId, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM raster ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Insert cells `(code, polygon)` into a raster. Centroids are computed from the polygons.
    pub fn add_cells(&mut self, raster: RasterId, cells: &[(String, MultiPolygon<f64>)]) -> Result<Vec<CellId>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(cells.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raster_cell (raster_id, code, centroid_x, centroid_y, geom) VALUES (?1, ?2, ?3, ?4, ?5)"
            )?;
            for (code, geom) in cells {
                let centroid = geom.centroid()
                    .ok_or_else(|| anyhow!("[store] cell {code} has an empty geometry"))?;
                stmt.execute(params![raster, code, centroid.x(), centroid.y(), multipolygon_to_geojson(geom)])?;
                ids.push(CellId(tx.last_insert_rowid()));
            }
        }
        cache::invalidate_raster(&tx, raster)?;
        tx.commit()?;
        Ok(ids)
    }

    /// Number of cells of a raster, with or without census values.
    pub fn cell_count(&self, raster: RasterId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM raster_cell WHERE raster_id = ?1", params![raster], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Set (or replace) the census value of cells.
    pub fn set_census(&mut self, values: &[(CellId, f64)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        let mut rasters = BTreeSet::new();
        {
            let mut upsert = tx.prepare(
                "INSERT INTO census_value (cell_id, value) VALUES (?1, ?2)
                 ON CONFLICT (cell_id) DO UPDATE SET value = excluded.value"
            )?;
            let mut raster_of = tx.prepare("SELECT raster_id FROM raster_cell WHERE id = ?1")?;
            for (cell, value) in values {
                upsert.execute(params![cell, value])?;
                rasters.insert(raster_of.query_row(params![cell], |row| row.get::<_, RasterId>(0))?);
            }
        }
        for raster in rasters {
            cache::invalidate_raster(&tx, raster)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// All cells of a raster that carry a census value, ordered by id.
    pub fn census_cells(&self, raster: RasterId) -> Result<Vec<CensusCell>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.code, c.centroid_x, c.centroid_y, c.geom, v.value
             FROM raster_cell c JOIN census_value v ON v.cell_id = c.id
             WHERE c.raster_id = ?1 ORDER BY c.id"
        )?;
        let rows = stmt.query_map(params![raster], |row| Ok((
            row.get::<_, CellId>(0)?,
            row.get::<_, String>(1)?,
            Point::new(row.get(2)?, row.get(3)?),
            row.get::<_, String>(4)?,
            row.get::<_, f64>(5)?,
        )))?.collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, code, centroid, geom, census)| Ok(CensusCell {
                cell: RasterCell {
                    id,
                    raster,
                    geom: multipolygon_from_geojson(&geom).with_context(|| format!("[store] invalid geometry for {id}"))?,
                    code,
                    centroid,
                },
                census,
            }))
            .collect()
    }

    pub fn add_area_level(&mut self, name: &str) -> Result<AreaLevelId> {
        self.conn.execute("INSERT INTO area_level (name) VALUES (?1)", params![name])?;
        Ok(AreaLevelId(self.conn.last_insert_rowid()))
    }

    pub fn area_levels(&self) -> Result<Vec<(AreaLevelId, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM area_level ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn add_area(&mut self, level: AreaLevelId, geom: &MultiPolygon<f64>) -> Result<AreaId> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO area (area_level_id, geom) VALUES (?1, ?2)",
            params![level, multipolygon_to_geojson(geom)],
        )?;
        let id = AreaId(tx.last_insert_rowid());
        cache::invalidate_level(&tx, level)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_area_geometry(&mut self, area: AreaId, geom: &MultiPolygon<f64>) -> Result<()> {
        let tx = self.conn.transaction()?;
        let level = area_level_of(&tx, area)?;
        tx.execute("UPDATE area SET geom = ?2 WHERE id = ?1", params![area, multipolygon_to_geojson(geom)])?;
        cache::invalidate_level(&tx, level)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete an area. Fails while population entries still reference it.
    pub fn delete_area(&mut self, area: AreaId) -> Result<()> {
        let tx = self.conn.transaction()?;
        let level = area_level_of(&tx, area)?;
        tx.execute("DELETE FROM area WHERE id = ?1", params![area])
            .with_context(|| format!("[store] failed to delete {area}"))?;
        cache::invalidate_level(&tx, level)?;
        tx.commit()?;
        Ok(())
    }

    /// All areas of a level, ordered by id.
    pub fn areas(&self, level: AreaLevelId) -> Result<Vec<Area>> {
        let mut stmt = self.conn.prepare("SELECT id, geom FROM area WHERE area_level_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![level], |row| Ok((row.get::<_, AreaId>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, geom)| Ok(Area {
                id,
                level,
                geom: multipolygon_from_geojson(&geom).with_context(|| format!("[store] invalid geometry for {id}"))?,
            }))
            .collect()
    }

    pub fn add_population(&mut self, name: &str, level: AreaLevelId, raster: RasterId) -> Result<PopulationId> {
        self.conn.execute(
            "INSERT INTO population (name, area_level_id, raster_id) VALUES (?1, ?2, ?3)",
            params![name, level, raster],
        )?;
        Ok(PopulationId(self.conn.last_insert_rowid()))
    }

    pub fn population(&self, id: PopulationId) -> Result<Option<Population>> {
        Ok(self.conn.query_row(
            "SELECT id, name, area_level_id, raster_id FROM population WHERE id = ?1",
            params![id],
            |row| Ok(Population { id: row.get(0)?, name: row.get(1)?, level: row.get(2)?, raster: row.get(3)? }),
        ).optional()?)
    }

    pub fn populations(&self) -> Result<Vec<Population>> {
        let mut stmt = self.conn.prepare("SELECT id, name, area_level_id, raster_id FROM population ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Population { id: row.get(0)?, name: row.get(1)?, level: row.get(2)?, raster: row.get(3)? })
        })?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Write stratified entries of a dataset. Entries are immutable: rewriting a key fails.
    pub fn add_population_entries(&mut self, population: PopulationId, entries: &[PopulationEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO population_entry (population_id, area_id, age_group_id, gender_id, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            )?;
            for entry in entries {
                stmt.execute(params![population, entry.area, entry.stratum.age_group, entry.stratum.gender, entry.value])
                    .with_context(|| format!("[store] failed to write entry for {} {}", entry.area, entry.stratum))?;
            }
        }
        cache::invalidate_population(&tx, population)?;
        tx.commit()?;
        Ok(())
    }

    /// All entries of a dataset, ordered by area, then stratum.
    pub fn population_entries(&self, population: PopulationId) -> Result<Vec<PopulationEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT area_id, age_group_id, gender_id, value FROM population_entry
             WHERE population_id = ?1 ORDER BY area_id, age_group_id, gender_id"
        )?;
        let rows = stmt.query_map(params![population], |row| Ok(PopulationEntry {
            area: row.get(0)?,
            stratum: Stratum::new(row.get::<_, AgeGroupId>(1)?, row.get::<_, GenderId>(2)?),
            value: row.get(3)?,
        }))?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn area_level_of(conn: &rusqlite::Connection, area: AreaId) -> Result<AreaLevelId> {
    conn.query_row("SELECT area_level_id FROM area WHERE id = ?1", params![area], |row| row.get(0))
        .optional()?
        .ok_or_else(|| anyhow!("[store] {area} does not exist"))
}
