#![allow(dead_code)]

use geo::{polygon, MultiPolygon};
use popgrid::{
    AgeGroupId, AreaId, AreaLevelId, CellId, Config, GenderId, PopulationEntry, PopulationId, RasterId, Store,
    Stratum,
};

pub const EPS: f64 = 1e-9;

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]])
}

pub fn stratum(age_group: i64, gender: i64) -> Stratum {
    Stratum::new(AgeGroupId(age_group), GenderId(gender))
}

pub fn entry(area: AreaId, stratum: Stratum, value: f64) -> PopulationEntry {
    PopulationEntry { area, stratum, value }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} +/- {tolerance}, got {actual}",
    );
}

/// An in-memory store with one raster of 100 m square cells laid out in a single row
/// from x = 0, stored in the equal-area CRS.
pub struct Fixture {
    pub store: Store,
    pub config: Config,
    pub raster: RasterId,
    pub cells: Vec<CellId>,
}

impl Fixture {
    pub const CELL: f64 = 100.0;

    pub fn new(census: &[f64]) -> Self {
        let config = Config::planar();
        let mut store = Store::open_in_memory().unwrap();
        let raster = store.add_raster("grid_100m").unwrap();

        let geoms = (0..census.len())
            .map(|i| (format!("100mN0E{i}"), rect(i as f64 * Self::CELL, 0.0, (i + 1) as f64 * Self::CELL, Self::CELL)))
            .collect::<Vec<_>>();
        let cells = store.add_cells(raster, &geoms).unwrap();
        store.set_census(&cells.iter().copied().zip(census.iter().copied()).collect::<Vec<_>>()).unwrap();

        Self { store, config, raster, cells }
    }

    /// Add a level whose areas span the given x ranges over the full row height.
    pub fn level(&mut self, name: &str, spans: &[(f64, f64)]) -> (AreaLevelId, Vec<AreaId>) {
        let level = self.store.add_area_level(name).unwrap();
        let areas = spans.iter()
            .map(|&(x0, x1)| self.store.add_area(level, &rect(x0, 0.0, x1, Self::CELL)).unwrap())
            .collect();
        (level, areas)
    }

    pub fn population(&mut self, name: &str, level: AreaLevelId, entries: &[PopulationEntry]) -> PopulationId {
        let id = self.store.add_population(name, level, self.raster).unwrap();
        self.store.add_population_entries(id, entries).unwrap();
        id
    }
}
