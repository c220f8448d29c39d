use std::fmt;

use geo::{MultiPolygon, Point};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Declare a row identifier newtype backed by an SQLite integer key.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> { self.0.to_sql() }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

row_id!(
    /// Identifies a statistical population raster.
    RasterId
);
row_id!(
    /// Identifies one cell of a raster. Unique across rasters.
    CellId
);
row_id!(
    /// Identifies a named partition of space (municipalities, planning zones, ...).
    AreaLevelId
);
row_id!(
    /// Identifies a single planning polygon.
    AreaId
);
row_id!(
    /// Identifies a stratified population dataset.
    PopulationId
);
row_id!(AgeGroupId);
row_id!(GenderId);

/// A distinct (age_group, gender) combination tracked independently through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stratum {
    pub age_group: AgeGroupId,
    pub gender: GenderId,
}

impl Stratum {
    #[inline]
    pub fn new(age_group: AgeGroupId, gender: GenderId) -> Self { Self { age_group, gender } }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(age_group={}, gender={})", self.age_group.0, self.gender.0)
    }
}

/// A fixed grid cell of a population raster, in the storage CRS.
#[derive(Debug, Clone)]
pub struct RasterCell {
    pub id: CellId,
    pub raster: RasterId,
    pub code: String,
    pub centroid: Point<f64>,
    pub geom: MultiPolygon<f64>,
}

/// A raster cell paired with its authoritative census count.
#[derive(Debug, Clone)]
pub struct CensusCell {
    pub cell: RasterCell,
    pub census: f64,
}

/// A planning polygon belonging to one area level, in the storage CRS.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: AreaId,
    pub level: AreaLevelId,
    pub geom: MultiPolygon<f64>,
}

/// A stratified population dataset collected at one area level.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub id: PopulationId,
    pub name: String,
    pub level: AreaLevelId,
    pub raster: RasterId,
}

/// A stratified count at the area level the data was collected at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationEntry {
    pub area: AreaId,
    pub stratum: Stratum,
    pub value: f64,
}

/// A disaggregated stratified count on one raster cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPopulation {
    pub cell: CellId,
    pub stratum: Stratum,
    pub value: f64,
}

/// A re-aggregated stratified count on one area of a target level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaPopulation {
    pub area: AreaId,
    pub stratum: Stratum,
    pub value: f64,
}
