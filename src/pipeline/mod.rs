mod batch;
mod summary;
mod unit;

pub use batch::{aggregate_all, aggregate_stale, disaggregate_all, run_unit, run_units};
pub use summary::{RunStatus, RunSummary, Unit, UnitRecord, UnitStats, UnitStatus};
pub use unit::{aggregate_one, disaggregate_one, AggregationOutcome, DisaggregationOutcome};
