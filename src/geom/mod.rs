mod bbox;
mod geojson;
mod geom;
mod proj;

use bbox::BoundingBox;
pub use geojson::{multipolygon_from_geojson, multipolygon_to_geojson};
pub(crate) use geom::Geometries;
pub(crate) use proj::EqualAreaProjector;
