#![doc = "popgrid public API"]
mod config;
mod error;
mod geom;
mod pipeline;
mod redistribute;
mod store;
mod types;
mod weights;

#[doc(inline)]
pub use config::{Config, UncoveredPolicy, ETRS89_LAEA, WGS84_LONLAT};

#[doc(inline)]
pub use error::RedistributionError;

#[doc(inline)]
pub use geom::{multipolygon_from_geojson, multipolygon_to_geojson};

#[doc(inline)]
pub use pipeline::{
    aggregate_all, aggregate_one, aggregate_stale, disaggregate_all, disaggregate_one, run_unit, run_units,
    AggregationOutcome, DisaggregationOutcome, RunStatus, RunSummary, Unit, UnitRecord, UnitStats, UnitStatus,
};

#[doc(inline)]
pub use redistribute::{aggregate, disaggregate, Aggregation, Disaggregation, UncoveredMass, UnlocatedMass};

#[doc(inline)]
pub use store::{totals_by_area, write_csv, AggregationCacheEntry, Store, StratumFilter};

#[doc(inline)]
pub use types::{
    AgeGroupId, Area, AreaId, AreaLevelId, AreaPopulation, CellId, CellPopulation, CensusCell, GenderId, Population,
    PopulationEntry, PopulationId, RasterCell, RasterId, Stratum,
};

#[doc(inline)]
pub use weights::{AreaCellWeight, SpatialWeightBuilder, WeightSet};
