use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::{
    error::RedistributionError,
    types::{AreaId, AreaPopulation, CellId, CellPopulation, Stratum},
    weights::WeightSet,
};

/// Cell-level population on cells that no area of the target level covers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UncoveredMass {
    pub total: f64,
    pub by_cell: BTreeMap<CellId, f64>,
}

impl UncoveredMass {
    #[inline] pub fn is_empty(&self) -> bool { self.by_cell.is_empty() }
}

/// Result of summing one dataset's cells into a target level.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Area rows ordered by area, then stratum. Zero-valued areas are omitted.
    pub rows: Vec<AreaPopulation>,
    pub uncovered: UncoveredMass,
    /// Sum of all input cell values.
    pub input_total: f64,
}

impl Aggregation {
    /// Mass assigned to areas.
    pub fn placed_total(&self) -> f64 { self.rows.iter().map(|row| row.value).sum() }
}

/// Sum cell values into the areas of the weight set's level with `share_area_of_cell`.
pub fn aggregate(cells: &[CellPopulation], weights: &WeightSet) -> Result<Aggregation> {
    let by_cell = weights.by_cell();

    let mut ordered = cells.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|row| (row.cell, row.stratum));

    let mut areas: BTreeMap<(AreaId, Stratum), f64> = BTreeMap::new();
    let mut uncovered = UncoveredMass::default();
    let mut input_total = 0.0;

    for row in ordered {
        if !row.value.is_finite() {
            return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                "{} {} has non-finite value {}", row.cell, row.stratum, row.value
            ))));
        }
        input_total += row.value;

        let Some(shares) = by_cell.get(&row.cell) else {
            uncovered.total += row.value;
            *uncovered.by_cell.entry(row.cell).or_default() += row.value;
            continue;
        };

        for share in shares {
            *areas.entry((share.area, row.stratum)).or_default() += row.value * share.share_area_of_cell;
        }
    }

    Ok(Aggregation {
        rows: areas.into_iter()
            .filter(|&(_, value)| value != 0.0)
            .map(|((area, stratum), value)| AreaPopulation { area, stratum, value })
            .collect(),
        uncovered,
        input_total,
    })
}
