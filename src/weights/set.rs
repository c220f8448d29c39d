use ahash::AHashMap;
use anyhow::{ensure, Result};

use crate::types::{AreaId, AreaLevelId, CellId, RasterId};

/// Overlap weight of one (area, cell) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaCellWeight {
    pub area: AreaId,
    pub cell: CellId,
    /// Fraction of the area's census mass that lies in this cell.
    pub share_cell_of_area: f64,
    /// Fraction of the cell's census mass that lies in this area.
    pub share_area_of_cell: f64,
}

/// The complete weight table of one (area level, raster) pair.
///
/// Rows are unique per (area, cell) and kept sorted by area, then cell.
#[derive(Debug, Clone)]
pub struct WeightSet {
    level: AreaLevelId,
    raster: RasterId,
    rows: Vec<AreaCellWeight>,
    unlocated_areas: Vec<AreaId>,
}

impl WeightSet {
    /// Assemble a weight set from rows in any order.
    pub fn new(level: AreaLevelId, raster: RasterId, mut rows: Vec<AreaCellWeight>, mut unlocated_areas: Vec<AreaId>) -> Self {
        rows.sort_unstable_by_key(|row| (row.area, row.cell));
        unlocated_areas.sort_unstable();
        Self { level, raster, rows, unlocated_areas }
    }

    #[inline] pub fn level(&self) -> AreaLevelId { self.level }

    #[inline] pub fn raster(&self) -> RasterId { self.raster }

    #[inline] pub fn rows(&self) -> &[AreaCellWeight] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Areas of the level whose overlap carried no census mass. They have no rows.
    #[inline] pub fn unlocated_areas(&self) -> &[AreaId] { &self.unlocated_areas }

    /// All rows of one area, sorted by cell.
    pub fn cells_of(&self, area: AreaId) -> &[AreaCellWeight] {
        let start = self.rows.partition_point(|row| row.area < area);
        let end = self.rows.partition_point(|row| row.area <= area);
        &self.rows[start..end]
    }

    /// Rows grouped by cell, for cell-to-area sums.
    pub fn by_cell(&self) -> AHashMap<CellId, Vec<&AreaCellWeight>> {
        let mut map: AHashMap<CellId, Vec<&AreaCellWeight>> = AHashMap::new();
        for row in &self.rows {
            map.entry(row.cell).or_default().push(row);
        }
        map
    }

    /// Number of distinct cells covered by at least one area.
    pub fn covered_cells(&self) -> usize { self.by_cell().len() }

    /// Check that shares lie in [0, 1] and that both share families sum to one.
    pub fn check_invariants(&self, epsilon: f64) -> Result<()> {
        for row in &self.rows {
            ensure!(
                (0.0..=1.0 + epsilon).contains(&row.share_cell_of_area)
                    && (0.0..=1.0 + epsilon).contains(&row.share_area_of_cell),
                "share out of range for {} / {}: {:?}", row.area, row.cell, row,
            );
        }

        let mut area_sums: AHashMap<AreaId, f64> = AHashMap::new();
        let mut cell_sums: AHashMap<CellId, f64> = AHashMap::new();
        for row in &self.rows {
            *area_sums.entry(row.area).or_default() += row.share_cell_of_area;
            *cell_sums.entry(row.cell).or_default() += row.share_area_of_cell;
        }

        for (area, sum) in area_sums {
            ensure!((sum - 1.0).abs() <= epsilon, "shares of cells in {area} sum to {sum}");
        }
        for (cell, sum) in cell_sums {
            ensure!((sum - 1.0).abs() <= epsilon, "shares of areas in {cell} sum to {sum}");
        }

        Ok(())
    }
}
