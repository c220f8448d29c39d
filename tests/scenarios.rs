mod common;

use common::{assert_close, entry, rect, stratum, Fixture, EPS};
use popgrid::{
    aggregate_one, disaggregate_one, run_unit, Config, RedistributionError, RunStatus, Store, StratumFilter, Unit,
};

#[test]
fn two_areas_sharing_one_cell_put_their_whole_mass_on_it() {
    let mut fx = Fixture::new(&[100.0]);
    let (level, areas) = fx.level("halves", &[(0.0, 50.0), (50.0, 100.0)]);
    let s = stratum(1, 1);
    let population = fx.population("residents", level, &[entry(areas[0], s, 30.0), entry(areas[1], s, 70.0)]);

    let outcome = disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    assert_eq!(outcome.rows_written, 1);
    assert_close(outcome.unlocated.total, 0.0, EPS);

    let rows = fx.store.cell_population(population, &StratumFilter::all()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell, fx.cells[0]);
    assert_close(rows[0].value, 100.0, EPS);
}

#[test]
fn one_area_over_two_cells_follows_census() {
    let mut fx = Fixture::new(&[40.0, 60.0]);
    let (level, areas) = fx.level("whole", &[(0.0, 200.0)]);
    let population = fx.population("residents", level, &[entry(areas[0], stratum(1, 1), 100.0)]);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();

    let rows = fx.store.cell_population(population, &StratumFilter::all()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_close(rows[0].value, 40.0, EPS);
    assert_close(rows[1].value, 60.0, EPS);
}

#[test]
fn area_without_census_cells_is_unlocated() {
    let mut fx = Fixture::new(&[50.0, 0.0]);
    // a2 only overlaps a census-free cell, a3 lies outside the raster.
    let (level, areas) = fx.level("mixed", &[(0.0, 100.0), (100.0, 200.0), (500.0, 600.0)]);
    let s = stratum(2, 1);
    let population = fx.population("residents", level, &[
        entry(areas[0], s, 10.0),
        entry(areas[1], s, 20.0),
        entry(areas[2], s, 50.0),
    ]);

    let summary = run_unit(&mut fx.store, &fx.config, Unit::Disaggregate(population)).unwrap();
    assert_eq!(summary.status(), RunStatus::Warnings);
    assert_eq!(summary.status().code(), 1);

    let outcome = disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    assert_close(outcome.unlocated.total, 70.0, EPS);
    assert_close(outcome.unlocated.by_area[&areas[1]], 20.0, EPS);
    assert_close(outcome.unlocated.by_area[&areas[2]], 50.0, EPS);
    assert_close(outcome.placed_total, 10.0, EPS);

    let rows = fx.store.cell_population(population, &StratumFilter::all()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell, fx.cells[0]);

    let weights = fx.store.weights(level, fx.raster).unwrap();
    assert_eq!(weights.unlocated_areas(), &[areas[1], areas[2]]);
    assert!(weights.cells_of(areas[2]).is_empty());
}

#[test]
fn uncovered_cells_are_reported_not_lost() {
    let mut fx = Fixture::new(&[10.0, 20.0, 30.0]);
    let (source, source_areas) = fx.level("whole", &[(0.0, 300.0)]);
    let (target, _) = fx.level("west", &[(0.0, 200.0)]);
    let population = fx.population("residents", source, &[entry(source_areas[0], stratum(1, 1), 60.0)]);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let outcome = aggregate_one(&mut fx.store, &fx.config, population, target).unwrap();

    assert_close(outcome.uncovered.total, 30.0, EPS);
    assert_eq!(outcome.uncovered.by_cell.len(), 1);
    assert_close(outcome.placed_total + outcome.uncovered.total, outcome.input_total, EPS);
}

#[test]
fn lon_lat_cells_are_measured_in_equal_area() {
    let config = Config::default();
    let mut store = Store::open_in_memory().unwrap();
    let raster = store.add_raster("grid_lonlat").unwrap();
    let cells = store.add_cells(raster, &[("c".to_string(), rect(10.0, 52.0, 10.01, 52.01))]).unwrap();
    store.set_census(&[(cells[0], 100.0)]).unwrap();

    let whole = store.add_area_level("whole").unwrap();
    let area = store.add_area(whole, &rect(10.0, 52.0, 10.01, 52.01)).unwrap();
    let split = store.add_area_level("split").unwrap();
    let west = store.add_area(split, &rect(10.0, 52.0, 10.005, 52.01)).unwrap();
    let east = store.add_area(split, &rect(10.005, 52.0, 10.01, 52.01)).unwrap();

    let population = store.add_population("residents", whole, raster).unwrap();
    store.add_population_entries(population, &[entry(area, stratum(1, 1), 100.0)]).unwrap();

    disaggregate_one(&mut store, &config, population).unwrap();
    aggregate_one(&mut store, &config, population, split).unwrap();

    let all = StratumFilter::all();
    assert_close(store.area_total(population, west, &all).unwrap(), 50.0, 0.05);
    assert_close(store.area_total(population, east, &all).unwrap(), 50.0, 0.05);
}

#[test]
fn unknown_dataset_is_a_configuration_error() {
    let mut fx = Fixture::new(&[1.0]);
    let err = disaggregate_one(&mut fx.store, &fx.config, popgrid::PopulationId(99)).unwrap_err();
    assert_eq!(RedistributionError::kind_of(&err), "configuration");
}

#[test]
fn cells_without_census_are_a_data_integrity_error() {
    let mut fx = Fixture::new(&[]);
    let raster = fx.store.add_raster("uncounted").unwrap();
    fx.store.add_cells(raster, &[("c".to_string(), rect(0.0, 0.0, 100.0, 100.0))]).unwrap();
    let (level, areas) = fx.level("whole", &[(0.0, 100.0)]);
    let population = fx.store.add_population("residents", level, raster).unwrap();
    fx.store.add_population_entries(population, &[entry(areas[0], stratum(1, 1), 5.0)]).unwrap();

    let err = disaggregate_one(&mut fx.store, &fx.config, population).unwrap_err();
    assert_eq!(RedistributionError::kind_of(&err), "data_integrity");
}

#[test]
fn aggregating_before_disaggregating_is_refused() {
    let mut fx = Fixture::new(&[10.0]);
    let (level, areas) = fx.level("whole", &[(0.0, 100.0)]);
    let population = fx.population("residents", level, &[entry(areas[0], stratum(1, 1), 8.0)]);

    let err = aggregate_one(&mut fx.store, &fx.config, population, level).unwrap_err();
    assert_eq!(RedistributionError::kind_of(&err), "configuration");
    assert!(!fx.store.is_up_to_date(population, level).unwrap());
    assert!(fx.store.area_population(population, level, &StratumFilter::all()).unwrap().is_empty());

    let summary = run_unit(&mut fx.store, &fx.config, Unit::Aggregate(population, level)).unwrap();
    assert_eq!(summary.status(), RunStatus::Failed);
}
