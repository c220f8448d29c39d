use std::path::PathBuf;

/// Population redistribution between area levels and a census raster
#[derive(clap::Parser, Debug)]
#[command(name = "popgrid", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// SQLite database holding inputs and outputs
    #[arg(long, global = true, default_value = "popgrid.db", value_hint = clap::ValueHint::FilePath)]
    pub db: PathBuf,

    /// JSON configuration file
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Drop secondary indexes for the duration of a batch
    #[arg(long, global = true)]
    pub drop_indexes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Spread area-level datasets onto raster cells
    Disaggregate(DisaggregateArgs),

    /// Sum cell-level datasets into a target area level
    Aggregate(AggregateArgs),

    /// Inspect or invalidate the aggregation cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Write an output table to CSV
    #[command(subcommand)]
    Export(ExportCommand),
}

#[derive(clap::Args, Debug)]
pub struct DisaggregateArgs {
    /// Dataset id
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub population: Option<i64>,

    /// Disaggregate every dataset
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct AggregateArgs {
    /// Dataset id
    #[arg(requires = "level", required_unless_present_any = ["all", "stale"], conflicts_with_all = ["all", "stale"])]
    pub population: Option<i64>,

    /// Target area level id
    #[arg(requires = "population")]
    pub level: Option<i64>,

    /// Aggregate every dataset into every area level
    #[arg(long, conflicts_with = "stale")]
    pub all: bool,

    /// Aggregate only pairs whose cache entry is not up to date
    #[arg(long)]
    pub stale: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum CacheCommand {
    /// Print every cache entry
    List,

    /// Mark entries stale
    Invalidate(InvalidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct InvalidateArgs {
    /// Only entries of this dataset
    #[arg(long)]
    pub population: Option<i64>,

    /// Only entries of this area level
    #[arg(long)]
    pub level: Option<i64>,

    /// Entries of every dataset disaggregated onto this raster
    #[arg(long, conflicts_with_all = ["population", "level"])]
    pub raster: Option<i64>,
}

#[derive(clap::Args, Debug)]
pub struct StratumArgs {
    /// Restrict to these age group ids
    #[arg(long = "age-group", value_delimiter = ',')]
    pub age_groups: Vec<i64>,

    /// Restrict to these gender ids
    #[arg(long = "gender", value_delimiter = ',')]
    pub genders: Vec<i64>,
}

#[derive(clap::Subcommand, Debug)]
pub enum ExportCommand {
    /// Disaggregated cell rows of a dataset
    Cells {
        population: i64,

        #[command(flatten)]
        strata: StratumArgs,

        /// Output CSV file, defaults to "./cells.csv"
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Aggregated area rows of a dataset at a level
    Areas {
        population: i64,
        level: i64,

        #[command(flatten)]
        strata: StratumArgs,

        /// Sum over strata, one row per area
        #[arg(long)]
        totals: bool,

        /// Output CSV file, defaults to "./areas.csv"
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Stored weight table of a (level, raster) pair
    Weights {
        level: i64,
        raster: i64,

        /// Output CSV file, defaults to "./weights.csv"
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}
