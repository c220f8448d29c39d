use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::{
    error::RedistributionError,
    types::{AreaId, CellId, CellPopulation, PopulationEntry, Stratum},
    weights::WeightSet,
};

/// Area-level population that found no census-bearing cell to land on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlocatedMass {
    pub total: f64,
    pub by_area: BTreeMap<AreaId, f64>,
}

impl UnlocatedMass {
    fn add(&mut self, area: AreaId, value: f64) {
        self.total += value;
        *self.by_area.entry(area).or_default() += value;
    }

    #[inline] pub fn is_empty(&self) -> bool { self.by_area.is_empty() }
}

/// Result of spreading one dataset onto raster cells.
#[derive(Debug, Clone, Default)]
pub struct Disaggregation {
    /// Cell rows ordered by cell, then stratum. Zero-valued cells are omitted.
    pub rows: Vec<CellPopulation>,
    pub unlocated: UnlocatedMass,
    /// Sum of all input entries.
    pub input_total: f64,
}

impl Disaggregation {
    /// Mass actually placed on cells.
    pub fn placed_total(&self) -> f64 { self.rows.iter().map(|row| row.value).sum() }
}

/// Spread area-level entries onto cells with `share_cell_of_area`.
///
/// Contributions of several areas to one cell are summed per stratum. Entries of
/// areas without weight rows are reported as unlocated, never dropped silently.
pub fn disaggregate(entries: &[PopulationEntry], weights: &WeightSet) -> Result<Disaggregation> {
    // Canonical order keeps floating-point sums identical between runs.
    let mut ordered = entries.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|entry| (entry.area, entry.stratum));

    let mut cells: BTreeMap<(CellId, Stratum), f64> = BTreeMap::new();
    let mut unlocated = UnlocatedMass::default();
    let mut input_total = 0.0;

    for entry in ordered {
        if !entry.value.is_finite() {
            return Err(anyhow!(RedistributionError::DataIntegrity(format!(
                "entry for {} {} has non-finite value {}", entry.area, entry.stratum, entry.value
            ))));
        }
        input_total += entry.value;

        let rows = weights.cells_of(entry.area);
        if rows.is_empty() {
            unlocated.add(entry.area, entry.value);
            continue;
        }

        for row in rows {
            *cells.entry((row.cell, entry.stratum)).or_default() += entry.value * row.share_cell_of_area;
        }
    }

    if !unlocated.is_empty() {
        log::warn!(
            "[disaggregate] {:.3} persons in {} areas could not be located on {}",
            unlocated.total, unlocated.by_area.len(), weights.raster(),
        );
    }

    Ok(Disaggregation {
        rows: cells.into_iter()
            .filter(|&(_, value)| value != 0.0)
            .map(|((cell, stratum), value)| CellPopulation { cell, stratum, value })
            .collect(),
        unlocated,
        input_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        types::{AgeGroupId, AreaLevelId, GenderId, RasterId},
        weights::AreaCellWeight,
    };

    fn stratum(age: i64, gender: i64) -> Stratum { Stratum::new(AgeGroupId(age), GenderId(gender)) }

    fn entry(area: i64, s: Stratum, value: f64) -> PopulationEntry {
        PopulationEntry { area: AreaId(area), stratum: s, value }
    }

    fn weight(area: i64, cell: i64, share_cell_of_area: f64, share_area_of_cell: f64) -> AreaCellWeight {
        AreaCellWeight { area: AreaId(area), cell: CellId(cell), share_cell_of_area, share_area_of_cell }
    }

    #[test]
    fn contributions_to_a_shared_cell_are_summed() {
        let weights = WeightSet::new(AreaLevelId(1), RasterId(1), vec![
            weight(1, 1, 1.0, 0.5),
            weight(2, 1, 1.0, 0.5),
        ], vec![]);

        let result = disaggregate(&[entry(1, stratum(1, 1), 30.0), entry(2, stratum(1, 1), 70.0)], &weights).unwrap();
        assert_eq!(result.rows, vec![CellPopulation { cell: CellId(1), stratum: stratum(1, 1), value: 100.0 }]);
        assert!(result.unlocated.is_empty());
    }

    #[test]
    fn strata_stay_separate() {
        let weights = WeightSet::new(AreaLevelId(1), RasterId(1), vec![
            weight(1, 1, 0.25, 1.0),
            weight(1, 2, 0.75, 1.0),
        ], vec![]);

        let result = disaggregate(&[entry(1, stratum(2, 1), 8.0), entry(1, stratum(1, 2), 4.0)], &weights).unwrap();
        let values = result.rows.iter().map(|r| (r.cell.0, r.stratum, r.value)).collect::<Vec<_>>();
        assert_eq!(values, vec![
            (1, stratum(1, 2), 1.0),
            (1, stratum(2, 1), 2.0),
            (2, stratum(1, 2), 3.0),
            (2, stratum(2, 1), 6.0),
        ]);
        assert_eq!(result.placed_total(), result.input_total);
    }

    #[test]
    fn areas_without_rows_are_unlocated() {
        let weights = WeightSet::new(AreaLevelId(1), RasterId(1), vec![weight(1, 1, 1.0, 1.0)], vec![AreaId(2)]);

        let result = disaggregate(&[
            entry(1, stratum(1, 1), 5.0),
            entry(2, stratum(1, 1), 7.0),
            entry(2, stratum(1, 2), 3.0),
        ], &weights).unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.unlocated.total, 10.0);
        assert_eq!(result.unlocated.by_area[&AreaId(2)], 10.0);
        assert_eq!(result.input_total, 15.0);
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let weights = WeightSet::new(AreaLevelId(1), RasterId(1), vec![weight(1, 1, 1.0, 1.0)], vec![]);
        let err = disaggregate(&[entry(1, stratum(1, 1), f64::NAN)], &weights).unwrap_err();
        assert_eq!(RedistributionError::kind_of(&err), "data_integrity");
    }
}
