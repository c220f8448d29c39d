mod builder;
mod set;

pub use builder::SpatialWeightBuilder;
pub use set::{AreaCellWeight, WeightSet};
