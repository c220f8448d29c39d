use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// WGS84 longitude/latitude, the default storage CRS.
pub const WGS84_LONLAT: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// ETRS89 Lambda Azimuthal Equal-Area (EPSG:3035), the default metric CRS for overlap areas.
pub const ETRS89_LAEA: &str =
    "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +units=m +no_defs +type=crs";

/// What to do with cells carrying population that no area of the target level covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UncoveredPolicy {
    /// Report the mass in the outcome and log a warning.
    Warn,
    /// Report the mass in the outcome only.
    Ignore,
}

/// Run configuration, typically read from a JSON file next to the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PROJ.4 string of the CRS geometries are stored in.
    pub storage_crs: String,
    /// PROJ.4 string of the equal-area CRS used to measure overlaps.
    pub equal_area_crs: String,
    /// Tolerance for share sums and round-trip comparisons.
    pub epsilon: f64,
    /// Drop secondary indexes for the duration of a batch, then restore them.
    pub drop_indexes: bool,
    pub uncovered_cells: UncoveredPolicy,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_crs: WGS84_LONLAT.to_string(),
            equal_area_crs: ETRS89_LAEA.to_string(),
            epsilon: 1e-9,
            drop_indexes: false,
            uncovered_cells: UncoveredPolicy::Warn,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Configuration for geometries that are already stored in an equal-area CRS.
    pub fn planar() -> Self {
        Self { storage_crs: ETRS89_LAEA.to_string(), ..Self::default() }
    }

    /// True if overlaps can be measured without reprojecting.
    #[inline]
    pub fn is_equal_area_storage(&self) -> bool {
        self.storage_crs.trim() == self.equal_area_crs.trim()
    }

    /// Parse a configuration from JSON text; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .context("[config] Failed to parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read configuration file: {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.epsilon > 0.0 && self.epsilon < 1e-3, "[config] epsilon must be in (0, 1e-3), got {}", self.epsilon);
        ensure!(!self.storage_crs.trim().is_empty(), "[config] storage_crs must not be empty");
        ensure!(!self.equal_area_crs.trim().is_empty(), "[config] equal_area_crs must not be empty");
        Ok(())
    }
}
