mod common;

use common::{assert_close, entry, stratum, Fixture, EPS};
use popgrid::{aggregate_one, disaggregate_one, StratumFilter};

#[test]
fn aggregating_back_to_the_source_level_restores_every_stratum() {
    let mut fx = Fixture::new(&[10.0, 20.0, 30.0, 40.0]);
    let (level, areas) = fx.level("districts", &[(0.0, 200.0), (200.0, 400.0)]);
    let strata = [stratum(1, 1), stratum(1, 2), stratum(2, 1)];
    let entries = vec![
        entry(areas[0], strata[0], 12.0),
        entry(areas[0], strata[1], 7.5),
        entry(areas[0], strata[2], 3.0),
        entry(areas[1], strata[0], 40.0),
        entry(areas[1], strata[1], 0.25),
        entry(areas[1], strata[2], 19.0),
    ];
    let population = fx.population("residents", level, &entries);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let outcome = aggregate_one(&mut fx.store, &fx.config, population, level).unwrap();
    assert!(outcome.uncovered.is_empty());

    let rows = fx.store.area_population(population, level, &StratumFilter::all()).unwrap();
    assert_eq!(rows.len(), entries.len());
    for expected in &entries {
        let row = rows.iter()
            .find(|row| row.area == expected.area && row.stratum == expected.stratum)
            .unwrap();
        assert_close(row.value, expected.value, EPS);
    }
}

#[test]
fn aggregating_into_another_level_conserves_mass() {
    let mut fx = Fixture::new(&[10.0, 20.0, 30.0, 40.0]);
    let (source, source_areas) = fx.level("districts", &[(0.0, 200.0), (200.0, 400.0)]);
    let (target, target_areas) = fx.level("zones", &[(0.0, 150.0), (150.0, 330.0), (330.0, 400.0)]);
    let population = fx.population("residents", source, &[
        entry(source_areas[0], stratum(1, 1), 30.0),
        entry(source_areas[0], stratum(2, 2), 6.0),
        entry(source_areas[1], stratum(1, 1), 70.0),
    ]);

    let disaggregated = disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let outcome = aggregate_one(&mut fx.store, &fx.config, population, target).unwrap();

    assert_close(disaggregated.placed_total, 106.0, EPS);
    assert_close(outcome.input_total, 106.0, EPS);
    assert_close(outcome.placed_total, 106.0, 1e-6);
    assert!(outcome.uncovered.is_empty());

    // All of cell 0 and half of cell 1, in both strata.
    let all = StratumFilter::all();
    let first = fx.store.area_total(population, target_areas[0], &all).unwrap();
    assert_close(first, 30.0 * 10.0 / 30.0 + 30.0 * 20.0 / 30.0 * 0.5 + 6.0 * 10.0 / 30.0 + 6.0 * 20.0 / 30.0 * 0.5, 1e-6);

    let total = target_areas.iter()
        .map(|&area| fx.store.area_total(population, area, &all).unwrap())
        .sum::<f64>();
    assert_close(total, 106.0, 1e-6);
}

#[test]
fn rerunning_disaggregation_reproduces_identical_rows() {
    let mut fx = Fixture::new(&[3.0, 5.0, 7.0]);
    let (level, areas) = fx.level("districts", &[(0.0, 130.0), (130.0, 300.0)]);
    let population = fx.population("residents", level, &[
        entry(areas[0], stratum(1, 1), 11.0),
        entry(areas[1], stratum(1, 1), 13.0),
        entry(areas[1], stratum(1, 2), 17.0),
    ]);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let first = fx.store.cell_population(population, &StratumFilter::all()).unwrap();
    let first_weights = fx.store.weights(level, fx.raster).unwrap();

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let second = fx.store.cell_population(population, &StratumFilter::all()).unwrap();
    let second_weights = fx.store.weights(level, fx.raster).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_weights.rows(), second_weights.rows());
}

#[test]
fn stored_weights_satisfy_both_share_sums() {
    let mut fx = Fixture::new(&[4.0, 0.0, 9.0, 16.0, 25.0]);
    let (level, areas) = fx.level("irregular", &[(0.0, 70.0), (70.0, 260.0), (260.0, 410.0), (410.0, 500.0)]);
    let population = fx.population("residents", level, &[entry(areas[0], stratum(1, 1), 1.0)]);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();

    let weights = fx.store.weights(level, fx.raster).unwrap();
    assert!(!weights.is_empty());
    weights.check_invariants(EPS).unwrap();

    for row in weights.rows() {
        assert!((0.0..=1.0 + EPS).contains(&row.share_cell_of_area));
        assert!((0.0..=1.0 + EPS).contains(&row.share_area_of_cell));
    }
}

#[test]
fn shared_cell_goes_back_by_census_share_and_keeps_the_total() {
    let mut fx = Fixture::new(&[100.0]);
    let (level, areas) = fx.level("halves", &[(0.0, 50.0), (50.0, 100.0)]);
    let s = stratum(1, 1);
    let population = fx.population("residents", level, &[entry(areas[0], s, 30.0), entry(areas[1], s, 70.0)]);

    disaggregate_one(&mut fx.store, &fx.config, population).unwrap();
    let outcome = aggregate_one(&mut fx.store, &fx.config, population, level).unwrap();

    // One cell cannot tell the two halves apart, so it splits by its census share.
    let all = StratumFilter::all();
    assert_close(fx.store.area_total(population, areas[0], &all).unwrap(), 50.0, EPS);
    assert_close(fx.store.area_total(population, areas[1], &all).unwrap(), 50.0, EPS);
    assert_close(outcome.placed_total, 100.0, EPS);
    assert!(outcome.uncovered.is_empty());
}
