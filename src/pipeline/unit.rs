use anyhow::{anyhow, Result};

use crate::{
    config::{Config, UncoveredPolicy},
    error::RedistributionError,
    pipeline::UnitStats,
    redistribute::{aggregate, disaggregate, UncoveredMass, UnlocatedMass},
    store::{Store, StratumFilter},
    types::{AreaLevelId, Population, PopulationId},
    weights::{SpatialWeightBuilder, WeightSet},
};

/// Result of disaggregating one dataset.
#[derive(Debug, Clone)]
pub struct DisaggregationOutcome {
    pub population: Population,
    pub weight_rows: usize,
    pub rows_written: usize,
    pub input_total: f64,
    pub placed_total: f64,
    pub unlocated: UnlocatedMass,
}

/// Result of aggregating one dataset into one target level.
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    pub population: Population,
    pub level: AreaLevelId,
    pub weight_rows: usize,
    pub rows_written: usize,
    pub input_total: f64,
    pub placed_total: f64,
    pub uncovered: UncoveredMass,
}

impl From<&DisaggregationOutcome> for UnitStats {
    fn from(outcome: &DisaggregationOutcome) -> Self {
        Self {
            weight_rows: outcome.weight_rows,
            rows_written: outcome.rows_written,
            input_total: outcome.input_total,
            placed_total: outcome.placed_total,
            unlocated: outcome.unlocated.total,
            uncovered: 0.0,
        }
    }
}

impl From<&AggregationOutcome> for UnitStats {
    fn from(outcome: &AggregationOutcome) -> Self {
        Self {
            weight_rows: outcome.weight_rows,
            rows_written: outcome.rows_written,
            input_total: outcome.input_total,
            placed_total: outcome.placed_total,
            unlocated: 0.0,
            uncovered: outcome.uncovered.total,
        }
    }
}

fn load_population(store: &Store, id: PopulationId) -> Result<Population> {
    store.population(id)?
        .ok_or_else(|| anyhow!(RedistributionError::Configuration(format!("{id} does not exist"))))
}

/// Rebuild the weight set of `level` against the raster of `population`.
fn build_weights(store: &Store, config: &Config, population: &Population, level: AreaLevelId) -> Result<WeightSet> {
    let raster = population.raster;

    if !store.area_levels()?.iter().any(|(id, _)| *id == level) {
        return Err(anyhow!(RedistributionError::Configuration(format!("{level} does not exist"))));
    }
    if !store.rasters()?.iter().any(|(id, _)| *id == raster) {
        return Err(anyhow!(RedistributionError::Configuration(format!("{raster} does not exist"))));
    }

    let areas = store.areas(level)?;
    let cells = store.census_cells(raster)?;
    if cells.is_empty() && store.cell_count(raster)? > 0 {
        return Err(anyhow!(RedistributionError::DataIntegrity(format!("{raster} has cells but no census values"))));
    }

    let weights = SpatialWeightBuilder::new(config)?.build(level, raster, &areas, &cells)?;
    if let Err(err) = weights.check_invariants(config.epsilon) {
        log::warn!("[weights] {level} x {raster}: {err}");
    }
    Ok(weights)
}

/// Spread one dataset onto the cells of its raster, replacing its previous cell rows.
pub fn disaggregate_one(store: &mut Store, config: &Config, id: PopulationId) -> Result<DisaggregationOutcome> {
    let population = load_population(store, id)?;
    log::info!("[disaggregate] {} ({}) from {} onto {}", population.name, id, population.level, population.raster);

    let weights = build_weights(store, config, &population, population.level)?;
    let entries = store.population_entries(id)?;
    let result = disaggregate(&entries, &weights)?;

    let rows_written = store.commit_disaggregation(&population, &weights, &result.rows)?;
    log::info!(
        "[disaggregate] {id}: wrote {rows_written} cell rows, placed {:.3} of {:.3} persons",
        result.placed_total(), result.input_total,
    );

    Ok(DisaggregationOutcome {
        weight_rows: weights.len(),
        rows_written,
        input_total: result.input_total,
        placed_total: result.placed_total(),
        unlocated: result.unlocated,
        population,
    })
}

/// Sum one dataset's cells into `level`, replacing its previous rows there and marking
/// the (dataset, level) cache entry up to date.
///
/// Fails with a configuration error unless the dataset's cell rows reflect its
/// current inputs.
pub fn aggregate_one(store: &mut Store, config: &Config, id: PopulationId, level: AreaLevelId) -> Result<AggregationOutcome> {
    let population = load_population(store, id)?;
    log::info!("[aggregate] {} ({}) into {} via {}", population.name, id, level, population.raster);

    if !store.is_disaggregation_up_to_date(id)? {
        return Err(anyhow!(RedistributionError::Configuration(format!(
            "cell rows of {id} are missing or stale, disaggregate it first"
        ))));
    }

    let weights = build_weights(store, config, &population, level)?;
    let cells = store.cell_population(id, &StratumFilter::all())?;
    let result = aggregate(&cells, &weights)?;

    if !result.uncovered.is_empty() && config.uncovered_cells == UncoveredPolicy::Warn {
        log::warn!(
            "[aggregate] {id} into {level}: {:.3} persons on {} cells are not covered by any area",
            result.uncovered.total, result.uncovered.by_cell.len(),
        );
    }

    let rows_written = store.commit_aggregation(&population, &weights, &result.rows)?;
    log::info!(
        "[aggregate] {id} into {level}: wrote {rows_written} area rows, placed {:.3} of {:.3} persons",
        result.placed_total(), result.input_total,
    );

    Ok(AggregationOutcome {
        level,
        weight_rows: weights.len(),
        rows_written,
        input_total: result.input_total,
        placed_total: result.placed_total(),
        uncovered: result.uncovered,
        population,
    })
}
