use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::{config::Config, error::RedistributionError};

/// True if a PROJ.4 string describes a geographic (lon/lat) CRS.
fn is_geographic(proj_string: &str) -> bool {
    ["+proj=longlat", "+proj=latlong", "+proj=lonlat", "+proj=latlon"].iter()
        .any(|token| proj_string.contains(token))
}

/// Reprojects storage geometries into the configured equal-area CRS, so that
/// overlap and cell areas are measured without metric distortion.
pub(crate) struct EqualAreaProjector {
    transform: Option<(Proj4, Proj4)>,
    source_geographic: bool,
}

impl EqualAreaProjector {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        if is_geographic(&config.equal_area_crs) {
            return Err(anyhow!(RedistributionError::Configuration(format!(
                "equal_area_crs must be a projected CRS, got: {}", config.equal_area_crs
            ))));
        }

        if config.is_equal_area_storage() {
            return Ok(Self { transform: None, source_geographic: false });
        }

        let from = {
            let proj_string = config.storage_crs.as_str();
            Proj4::from_proj_string(proj_string)
                .with_context(|| anyhow!("failed to build source PROJ.4: {proj_string}"))?
        };

        let to = {
            let proj_string = config.equal_area_crs.as_str();
            Proj4::from_proj_string(proj_string)
                .with_context(|| anyhow!("failed to build target PROJ.4: {proj_string}"))?
        };

        Ok(Self {
            transform: Some((from, to)),
            source_geographic: is_geographic(&config.storage_crs),
        })
    }

    /// Reproject shapes from the storage CRS to the equal-area CRS (meters).
    pub(crate) fn project(&self, shapes: &[MultiPolygon<f64>]) -> Result<Vec<MultiPolygon<f64>>> {
        let Some((from, to)) = &self.transform else { return Ok(shapes.to_vec()) };

        // Geographic input goes in as radians, metric output comes out as meters.
        shapes.iter()
            .map(|shape| shape.try_map_coords(|coord: Coord<f64>| {
                let mut point = if self.source_geographic {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.0)
                } else {
                    (coord.x, coord.y, 0.0)
                };
                transform(from, to, &mut point)
                    .with_context(|| format!("CRS transform failed at ({}, {})", coord.x, coord.y))?;
                Ok(Coord { x: point.0, y: point.1 })
            }))
            .collect()
    }
}
