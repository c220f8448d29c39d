//! SQLite schema of the redistribution store.
//!
//! Inputs (rasters, cells, census values, area levels, areas, populations and their
//! entries) are written by external collaborators. The weight table and both
//! stratified output tables are derived and only ever replaced as a whole per unit.

pub(super) const TABLES: &str = "
    CREATE TABLE IF NOT EXISTS raster (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS raster_cell (
        id INTEGER PRIMARY KEY,
        raster_id INTEGER NOT NULL REFERENCES raster(id) ON DELETE CASCADE,
        code TEXT NOT NULL,
        centroid_x REAL NOT NULL,
        centroid_y REAL NOT NULL,
        geom TEXT NOT NULL,
        UNIQUE (raster_id, code)
    );

    CREATE TABLE IF NOT EXISTS census_value (
        cell_id INTEGER PRIMARY KEY REFERENCES raster_cell(id) ON DELETE CASCADE,
        value REAL NOT NULL
    );

    CREATE TABLE IF NOT EXISTS area_level (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS area (
        id INTEGER PRIMARY KEY,
        area_level_id INTEGER NOT NULL REFERENCES area_level(id) ON DELETE CASCADE,
        geom TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS population (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        area_level_id INTEGER NOT NULL REFERENCES area_level(id),
        raster_id INTEGER NOT NULL REFERENCES raster(id)
    );

    CREATE TABLE IF NOT EXISTS population_entry (
        population_id INTEGER NOT NULL REFERENCES population(id) ON DELETE CASCADE,
        area_id INTEGER NOT NULL REFERENCES area(id),
        age_group_id INTEGER NOT NULL,
        gender_id INTEGER NOT NULL,
        value REAL NOT NULL,
        PRIMARY KEY (population_id, area_id, age_group_id, gender_id)
    );

    CREATE TABLE IF NOT EXISTS area_cell_weight (
        area_id INTEGER NOT NULL,
        cell_id INTEGER NOT NULL,
        area_level_id INTEGER NOT NULL,
        raster_id INTEGER NOT NULL,
        share_cell_of_area REAL NOT NULL CHECK (share_cell_of_area >= 0.0),
        share_area_of_cell REAL NOT NULL CHECK (share_area_of_cell >= 0.0),
        PRIMARY KEY (area_id, cell_id)
    );

    CREATE TABLE IF NOT EXISTS raster_cell_population_age_gender (
        population_id INTEGER NOT NULL,
        cell_id INTEGER NOT NULL,
        age_group_id INTEGER NOT NULL,
        gender_id INTEGER NOT NULL,
        value REAL NOT NULL,
        PRIMARY KEY (population_id, cell_id, age_group_id, gender_id)
    );

    CREATE TABLE IF NOT EXISTS area_population_age_gender (
        population_id INTEGER NOT NULL,
        area_id INTEGER NOT NULL,
        area_level_id INTEGER NOT NULL,
        age_group_id INTEGER NOT NULL,
        gender_id INTEGER NOT NULL,
        value REAL NOT NULL,
        PRIMARY KEY (population_id, area_id, age_group_id, gender_id)
    );

    CREATE TABLE IF NOT EXISTS disaggregation_state (
        population_id INTEGER PRIMARY KEY,
        up_to_date INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS aggregation_cache (
        population_id INTEGER NOT NULL,
        area_level_id INTEGER NOT NULL,
        up_to_date INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (population_id, area_level_id)
    );
";

/// Secondary indexes that bulk mode may drop and restore. Primary keys always stay.
pub(super) const SECONDARY_INDEXES: [(&str, &str); 5] = [
    ("idx_weight_level_raster", "CREATE INDEX IF NOT EXISTS idx_weight_level_raster ON area_cell_weight(area_level_id, raster_id)"),
    ("idx_weight_cell", "CREATE INDEX IF NOT EXISTS idx_weight_cell ON area_cell_weight(cell_id)"),
    ("idx_cell_population_cell", "CREATE INDEX IF NOT EXISTS idx_cell_population_cell ON raster_cell_population_age_gender(cell_id)"),
    ("idx_area_population_level", "CREATE INDEX IF NOT EXISTS idx_area_population_level ON area_population_age_gender(population_id, area_level_id)"),
    ("idx_area_population_area", "CREATE INDEX IF NOT EXISTS idx_area_population_area ON area_population_age_gender(area_id)"),
];
