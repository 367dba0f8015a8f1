//! Rolling status history over the last W days.
//!
//! For a reference day D the window covers `[D-W+1 ..= D]`. Every day is
//! classified and rolled up from scratch through [`LevelStatuses`]; nothing
//! is cached between calls, so changing D or W simply means building a new
//! window.

use std::collections::BTreeMap;

use chrono::Days;

use crate::alert::thresholds::{Severity, ThresholdLevel};
use crate::analysis::aggregation::StatusMap;
use crate::analysis::daily::LevelStatuses;
use crate::basin::BasinSnapshot;
use crate::logging::{self, Component};
use crate::model::Day;

/// Look-back used by the dashboard heatmaps.
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Dense entity × day severity matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusMatrix {
    days: Vec<Day>,
    rows: BTreeMap<String, Vec<Severity>>,
}

/// One (entity, day, severity) cell in long format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCell {
    pub id: String,
    pub day: Day,
    pub severity: Severity,
}

/// Row of the crossed-threshold table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossedRow {
    pub station_code: String,
    pub day: Day,
    pub severity: Severity,
}

impl StatusMatrix {
    /// Builds a matrix from one status map per day. Entities missing from a
    /// day's map get `NoInformation` for that day. Days and columns are
    /// paired in order; any surplus on either side is dropped.
    pub fn from_columns(mut days: Vec<Day>, columns: &[StatusMap]) -> Self {
        let width = days.len().min(columns.len());
        days.truncate(width);
        let columns = &columns[..width];
        let mut rows: BTreeMap<String, Vec<Severity>> = BTreeMap::new();
        for id in columns.iter().flat_map(|c| c.keys()) {
            rows.entry(id.clone()).or_default();
        }
        for (id, row) in rows.iter_mut() {
            *row = columns
                .iter()
                .map(|c| c.get(id).copied().unwrap_or_default())
                .collect();
        }
        Self { days, rows }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str, day: &Day) -> Option<Severity> {
        let col = self.days.iter().position(|d| d == day)?;
        self.rows.get(id).and_then(|row| row.get(col)).copied()
    }

    /// Severities of one entity, oldest day first.
    pub fn history(&self, id: &str) -> Option<&[Severity]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// All entities on one day.
    pub fn on_day(&self, day: &Day) -> StatusMap {
        match self.days.iter().position(|d| d == day) {
            Some(col) => self
                .rows
                .iter()
                .filter_map(|(id, row)| Some((id.clone(), *row.get(col)?)))
                .collect(),
            None => StatusMap::new(),
        }
    }

    /// Long format, entity-major then day ascending.
    pub fn to_long(&self) -> Vec<StatusCell> {
        self.rows
            .iter()
            .flat_map(|(id, row)| {
                self.days.iter().zip(row).map(move |(day, severity)| StatusCell {
                    id: id.clone(),
                    day: *day,
                    severity: *severity,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusWindow {
    pub reference_day: Day,
    pub stations: StatusMatrix,
    pub segments: StatusMatrix,
    pub units: StatusMatrix,
}

impl StatusWindow {
    /// Days covered by a window of `window_days` ending on `reference_day`,
    /// oldest first. Empty when `window_days` is 0.
    pub fn window_days(reference_day: Day, window_days: usize) -> Vec<Day> {
        (0..window_days as u64)
            .rev()
            .filter_map(|back| reference_day.checked_sub_days(Days::new(back)))
            .collect()
    }

    pub fn build(basin: &BasinSnapshot, reference_day: Day, window_days: usize) -> Self {
        let days = Self::window_days(reference_day, window_days);
        let mut stations = Vec::with_capacity(days.len());
        let mut segments = Vec::with_capacity(days.len());
        let mut units = Vec::with_capacity(days.len());
        for day in &days {
            let levels = LevelStatuses::compute(basin, *day);
            stations.push(levels.stations);
            segments.push(levels.segments);
            units.push(levels.units);
        }

        let window = Self {
            reference_day,
            stations: StatusMatrix::from_columns(days.clone(), &stations),
            segments: StatusMatrix::from_columns(days.clone(), &segments),
            units: StatusMatrix::from_columns(days, &units),
        };

        logging::debug(
            Component::Window,
            None,
            &format!(
                "Built {}-day window ending {}: {} stations, {} segments, {} units",
                window_days,
                reference_day,
                window.stations.rows.len(),
                window.segments.rows.len(),
                window.units.rows.len()
            ),
        );
        window
    }

    pub fn days(&self) -> &[Day] {
        self.stations.days()
    }

    /// Full window history of every station whose reference-day severity
    /// is at least `min_severity`. Days where such a station was below the
    /// level are included.
    pub fn crossed_threshold(&self, min_severity: Severity) -> Vec<CrossedRow> {
        let today = self.stations.on_day(&self.reference_day);
        self.stations
            .to_long()
            .into_iter()
            .filter(|cell| today.get(&cell.id).is_some_and(|s| *s >= min_severity))
            .map(|cell| CrossedRow {
                station_code: cell.id,
                day: cell.day,
                severity: cell.severity,
            })
            .collect()
    }

    /// [`StatusWindow::crossed_threshold`] for a named threshold.
    pub fn crossed_level(&self, level: ThresholdLevel) -> Vec<CrossedRow> {
        self.crossed_threshold(level.severity())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
