use std::fmt;

use crate::types::{AreaLevelId, PopulationId};

/// One independently committed piece of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Disaggregate(PopulationId),
    Aggregate(PopulationId, AreaLevelId),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disaggregate(population) => write!(f, "disaggregate {population}"),
            Self::Aggregate(population, level) => write!(f, "aggregate {population} into {level}"),
        }
    }
}

/// Figures reported by a successful unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnitStats {
    pub weight_rows: usize,
    pub rows_written: usize,
    pub input_total: f64,
    pub placed_total: f64,
    /// Area mass without a census-bearing cell (disaggregation).
    pub unlocated: f64,
    /// Cell mass without a covering area (aggregation).
    pub uncovered: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitStatus {
    Succeeded(UnitStats),
    Failed { kind: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub unit: Unit,
    pub status: UnitStatus,
}

/// Machine status of a run, usable as a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Every unit succeeded but some mass was unlocated or uncovered.
    Warnings,
    PartialFailure,
    Failed,
}

impl RunStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Warnings => 1,
            Self::PartialFailure => 2,
            Self::Failed => 3,
        }
    }
}

/// Outcome of a batch (or single-unit) run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: Vec<UnitRecord>,
}

impl RunSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = (&Unit, &UnitStats)> {
        self.records.iter().filter_map(|record| match &record.status {
            UnitStatus::Succeeded(stats) => Some((&record.unit, stats)),
            UnitStatus::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Unit, &str)> {
        self.records.iter().filter_map(|record| match &record.status {
            UnitStatus::Failed { message, .. } => Some((&record.unit, message.as_str())),
            UnitStatus::Succeeded(_) => None,
        })
    }

    pub fn rows_written(&self) -> usize { self.succeeded().map(|(_, s)| s.rows_written).sum() }

    pub fn unlocated(&self) -> f64 { self.succeeded().map(|(_, s)| s.unlocated).sum() }

    pub fn uncovered(&self) -> f64 { self.succeeded().map(|(_, s)| s.uncovered).sum() }

    pub fn status(&self) -> RunStatus {
        let (ok, failed) = (self.succeeded().count(), self.failed().count());
        match (ok, failed) {
            (0, 0) => RunStatus::Success,
            (0, _) => RunStatus::Failed,
            (_, 0) if self.unlocated() > 0.0 || self.uncovered() > 0.0 => RunStatus::Warnings,
            (_, 0) => RunStatus::Success,
            _ => RunStatus::PartialFailure,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f, "{}/{} units succeeded, {} rows written, {:.3} persons unlocated, {:.3} persons uncovered",
            self.succeeded().count(), self.records.len(), self.rows_written(), self.unlocated(), self.uncovered(),
        )?;
        for record in &self.records {
            match &record.status {
                UnitStatus::Succeeded(stats) => writeln!(
                    f, "  ok      {}: {} rows ({:.3} of {:.3} persons placed)",
                    record.unit, stats.rows_written, stats.placed_total, stats.input_total,
                )?,
                UnitStatus::Failed { kind, message } => writeln!(f, "  skipped {}: [{kind}] {message}", record.unit)?,
            }
        }
        Ok(())
    }
}
