use anyhow::{anyhow, Result};

use crate::{
    config::Config,
    error::RedistributionError,
    geom::{EqualAreaProjector, Geometries},
    types::{Area, AreaLevelId, CensusCell, RasterId},
    weights::{AreaCellWeight, WeightSet},
};

/// Computes (area, cell) overlap weights for one area level against one census raster.
///
/// The weight of a pair is the census mass of the cell attributable to the overlap,
/// assuming uniform density inside a cell:
/// `census(cell) * intersection_area / cell_area`, with both areas measured in the
/// configured equal-area CRS.
pub struct SpatialWeightBuilder {
    projector: EqualAreaProjector,
}

impl SpatialWeightBuilder {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self { projector: EqualAreaProjector::new(config)? })
    }

    /// Build the full weight set for `areas` (all of `level`) against the census cells of `raster`.
    pub fn build(&self, level: AreaLevelId, raster: RasterId, areas: &[Area], cells: &[CensusCell]) -> Result<WeightSet> {
        if areas.is_empty() {
            return Err(anyhow!(RedistributionError::Configuration(format!("{level} has no areas"))));
        }
        if cells.is_empty() {
            return Err(anyhow!(RedistributionError::Configuration(format!("{raster} has no census cells"))));
        }

        for area in areas {
            if area.level != level {
                return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                    "{} belongs to {}, expected {level}", area.id, area.level
                ))));
            }
            if area.geom.0.is_empty() {
                return Err(anyhow!(RedistributionError::DataIntegrity(format!("{} has an empty geometry", area.id))));
            }
        }
        for CensusCell { cell, census } in cells {
            if cell.raster != raster {
                return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                    "{} belongs to {}, expected {raster}", cell.id, cell.raster
                ))));
            }
            if !census.is_finite() || *census < 0.0 {
                return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                    "{} has invalid census value {census}", cell.id
                ))));
            }
        }

        let area_geoms = Geometries::new(self.projector.project(
            &areas.iter().map(|area| area.geom.clone()).collect::<Vec<_>>())?);
        let cell_geoms = Geometries::new(self.projector.project(
            &cells.iter().map(|c| c.cell.geom.clone()).collect::<Vec<_>>())?);

        let cell_areas = cell_geoms.areas();
        if let Some(i) = cell_areas.iter().position(|&a| !(a > 0.0)) {
            return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                "{} has a degenerate geometry (area {})", cells[i].cell.id, cell_areas[i]
            ))));
        }

        // (area_idx, cell_idx, census mass in overlap, overlap fraction of cell)
        let pairs = cell_geoms.overlaps_with(&area_geoms).into_iter()
            .map(|(a, c, overlap)| {
                let fraction = (overlap / cell_areas[c]).min(1.0);
                (a, c, cells[c].census * fraction, fraction)
            })
            .collect::<Vec<_>>();

        let mut area_totals = vec![0.0; area_geoms.len()];
        for &(a, _, weight, _) in &pairs {
            area_totals[a] += weight;
        }

        // Areas with no overlapping census mass get no rows at all.
        let located = pairs.into_iter()
            .filter(|&(a, ..)| area_totals[a] > 0.0)
            .collect::<Vec<_>>();

        let mut cell_totals = vec![0.0; cell_geoms.len()];
        let mut cell_fractions = vec![0.0; cell_geoms.len()];
        for &(_, c, weight, fraction) in &located {
            cell_totals[c] += weight;
            cell_fractions[c] += fraction;
        }

        let rows = located.into_iter()
            .map(|(a, c, weight, fraction)| AreaCellWeight {
                area: areas[a].id,
                cell: cells[c].cell.id,
                share_cell_of_area: weight / area_totals[a],
                // Census-free cells fall back to the geometric share.
                share_area_of_cell: if cell_totals[c] > 0.0 {
                    weight / cell_totals[c]
                } else {
                    fraction / cell_fractions[c]
                },
            })
            .collect::<Vec<_>>();

        let unlocated = areas.iter().zip(&area_totals)
            .filter(|&(_, &total)| !(total > 0.0))
            .map(|(area, _)| area.id)
            .collect::<Vec<_>>();

        let set = WeightSet::new(level, raster, rows, unlocated);
        log::debug!(
            "[weights] {level} x {raster}: {} rows, {} areas, {} covered cells, {} unlocated areas",
            set.len(), areas.len(), set.covered_cells(), set.unlocated_areas().len(),
        );

        Ok(set)
    }
}
