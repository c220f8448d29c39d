use anyhow::Result;

use crate::{
    config::Config,
    error::RedistributionError,
    pipeline::{aggregate_one, disaggregate_one, RunSummary, Unit, UnitRecord, UnitStats, UnitStatus},
    store::Store,
};

/// Run `units` one after another, each committed on its own.
///
/// A failing unit is logged and recorded; the remaining units still run. With
/// `config.drop_indexes`, secondary indexes are dropped for the whole batch and
/// restored afterwards, whatever the units did.
pub fn run_units(
    store: &mut Store,
    config: &Config,
    units: Vec<Unit>,
    mut op: impl FnMut(&mut Store, &Unit) -> Result<UnitStats>,
) -> Result<RunSummary> {
    if config.drop_indexes {
        if let Err(err) = store.begin_bulk_load() {
            restore_indexes(store);
            return Err(err);
        }
    }

    let total = units.len();
    let records = units.into_iter().enumerate()
        .map(|(i, unit)| {
            let status = match op(store, &unit) {
                Ok(stats) => {
                    log::info!("[batch] {}/{total} {unit}: ok", i + 1);
                    UnitStatus::Succeeded(stats)
                }
                Err(err) => {
                    let kind = RedistributionError::kind_of(&err);
                    log::error!("[batch] {}/{total} {unit}: failed ({kind}): {err:#}", i + 1);
                    UnitStatus::Failed { kind, message: format!("{err:#}") }
                }
            };
            UnitRecord { unit, status }
        })
        .collect::<Vec<_>>();

    if config.drop_indexes { restore_indexes(store); }

    let summary = RunSummary { records };
    log::info!(
        "[batch] {}/{} units succeeded, {} rows written",
        summary.succeeded().count(), summary.records.len(), summary.rows_written(),
    );
    Ok(summary)
}

/// Restore secondary indexes. A failure is logged; units already committed stay committed.
fn restore_indexes(store: &mut Store) {
    if let Err(err) = store.end_bulk_load() {
        log::error!("[batch] failed to restore secondary indexes, call end_bulk_load again: {err:#}");
    }
}

/// Execute a single unit with the same reporting as a batch.
pub fn run_unit(store: &mut Store, config: &Config, unit: Unit) -> Result<RunSummary> {
    run_units(store, config, vec![unit], |store, unit| execute(store, config, unit))
}

fn execute(store: &mut Store, config: &Config, unit: &Unit) -> Result<UnitStats> {
    match *unit {
        Unit::Disaggregate(population) => Ok((&disaggregate_one(store, config, population)?).into()),
        Unit::Aggregate(population, level) => Ok((&aggregate_one(store, config, population, level)?).into()),
    }
}

/// Disaggregate every dataset of the store.
pub fn disaggregate_all(store: &mut Store, config: &Config) -> Result<RunSummary> {
    let units = store.populations()?.into_iter()
        .map(|population| Unit::Disaggregate(population.id))
        .collect();
    run_units(store, config, units, |store, unit| execute(store, config, unit))
}

/// Aggregate every dataset into every area level. Datasets whose cell rows are
/// missing or stale are disaggregated first.
pub fn aggregate_all(store: &mut Store, config: &Config) -> Result<RunSummary> {
    let units = aggregation_units(store, false)?;
    run_units(store, config, units, |store, unit| execute(store, config, unit))
}

/// Aggregate only the (dataset, level) pairs whose cache entry is not up to date,
/// disaggregating first every dataset whose cell rows are missing or stale.
pub fn aggregate_stale(store: &mut Store, config: &Config) -> Result<RunSummary> {
    let units = aggregation_units(store, true)?;
    log::info!("[batch] {} stale units", units.len());
    run_units(store, config, units, |store, unit| execute(store, config, unit))
}

/// Units per dataset: its disaggregation if the cell rows are not fresh, then its
/// aggregates (all of them after a re-disaggregation, otherwise all or stale ones).
fn aggregation_units(store: &Store, only_stale: bool) -> Result<Vec<Unit>> {
    let levels = store.area_levels()?;
    let mut units = Vec::new();
    for population in store.populations()? {
        let redo_cells = !store.is_disaggregation_up_to_date(population.id)?;
        if redo_cells { units.push(Unit::Disaggregate(population.id)) }

        for (level, _) in &levels {
            if !only_stale || redo_cells || !store.is_up_to_date(population.id, *level)? {
                units.push(Unit::Aggregate(population.id, *level));
            }
        }
    }
    Ok(units)
}
