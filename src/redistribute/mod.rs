mod aggregate;
mod disaggregate;

pub use aggregate::{aggregate, Aggregation, UncoveredMass};
pub use disaggregate::{disaggregate, Disaggregation, UnlocatedMass};
