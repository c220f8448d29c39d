use std::fmt;

use anyhow::Error;

/// Errors that abort a single redistribution unit.
///
/// These travel inside `anyhow::Error`; use [`RedistributionError::kind_of`] to
/// classify an arbitrary error after the fact.
#[derive(Debug, Clone, PartialEq)]
pub enum RedistributionError {
    /// No raster, no area level or no dataset is available for the requested unit.
    Configuration(String),
    /// Census values or geometries violate the assumptions of the weight model.
    DataIntegrity(String),
    /// Replacing rows in the store failed; nothing of the unit was committed.
    BulkWrite(String),
}

impl RedistributionError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::DataIntegrity(_) => "data_integrity",
            Self::BulkWrite(_) => "bulk_write",
        }
    }

    /// Classify any error raised by the pipeline, looking through context layers.
    pub fn kind_of(err: &Error) -> &'static str {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<RedistributionError>())
            .or_else(|| err.downcast_ref::<RedistributionError>())
            .map_or("internal", |e| e.kind())
    }
}

impl fmt::Display for RedistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::DataIntegrity(msg) => write!(f, "data integrity error: {msg}"),
            Self::BulkWrite(msg) => write!(f, "bulk write error: {msg}"),
        }
    }
}

impl std::error::Error for RedistributionError {}
