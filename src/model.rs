/// Station, Segment, Unit, FlowReading, LoadError
///
/// Core data types for the basin status pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond small accessors, and no I/O.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

// ---------------------------------------------------------------------------
// Timestamp kinds
// ---------------------------------------------------------------------------

/// Canonical timestamp of a daily-mean (Qmj) reading.
pub type Day = NaiveDate;

/// Canonical timestamp of an instantaneous (Qi) reading, expressed in the
/// configured reference timezone.
pub type Instant = DateTime<Tz>;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One row of a flow table: a single measurement for one station.
///
/// `flow_m3` is `NaN` when the source cell was empty. Such readings still
/// occupy their timestamp (and win deduplication if they come first) but
/// classify as "no information".
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReading<T> {
    pub station_code: String,
    pub timestamp: T,
    pub flow_m3: f64,
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Regulatory low-flow thresholds for a station, in cubic meters.
///
/// By convention `doe >= da >= dar >= dc`, but nothing here enforces it.
/// A threshold missing from the source table is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thresholds {
    /// Débit d'objectif d'étiage.
    pub doe: Option<f64>,
    /// Débit d'alerte (80% of DOE).
    pub da: Option<f64>,
    /// Débit d'alerte renforcée.
    pub dar: Option<f64>,
    /// Débit de crise.
    pub dc: Option<f64>,
}

impl Thresholds {
    /// True when all four thresholds are present and not NaN.
    pub fn is_complete(&self) -> bool {
        [self.doe, self.da, self.dar, self.dc]
            .iter()
            .all(|t| t.is_some_and(|v| !v.is_nan()))
    }
}

// ---------------------------------------------------------------------------
// Basin entities
// ---------------------------------------------------------------------------

/// A gauging station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub code: String,
    pub name: String,
    /// WGS84 longitude, carried through for the presentation layer.
    pub longitude: Option<f64>,
    /// WGS84 latitude, carried through for the presentation layer.
    pub latitude: Option<f64>,
    pub thresholds: Thresholds,
    /// Hydrographic segment the station belongs to, if any.
    pub segment_id: Option<String>,
}

/// A hydrographic segment (reach of river network).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub name: String,
    /// Management unit the segment belongs to, if any.
    pub unit_id: Option<String>,
}

/// A management sub-unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while loading configuration or source tables.
///
/// Classification and aggregation never fail; everything that can go wrong
/// happens once, up front, while the snapshot is built.
#[derive(Debug, PartialEq)]
pub enum LoadError {
    /// A file could not be read.
    Io { path: String, message: String },
    /// A required column or property is absent from a table header.
    MissingColumn { table: String, column: String },
    /// A timestamp cell could not be parsed. The whole load fails.
    MalformedTimestamp { table: String, line: usize, value: String },
    /// A flow cell is neither empty nor a number.
    MalformedFlow { table: String, line: usize, value: String },
    /// A table is structurally broken (bad JSON, short row, wrong type).
    MalformedTable { table: String, message: String },
    /// Two rows of an entity table share the same identifier.
    DuplicateId { table: String, id: String },
    /// The configured reference timezone is not an IANA zone name.
    UnknownTimezone(String),
    /// The configuration file is invalid.
    Config(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
            LoadError::MissingColumn { table, column } => {
                write!(f, "Missing column '{}' in {}", column, table)
            }
            LoadError::MalformedTimestamp { table, line, value } => {
                write!(f, "Malformed timestamp '{}' in {} at line {}", value, table, line)
            }
            LoadError::MalformedFlow { table, line, value } => {
                write!(f, "Malformed flow value '{}' in {} at line {}", value, table, line)
            }
            LoadError::MalformedTable { table, message } => {
                write!(f, "Malformed table {}: {}", table, message)
            }
            LoadError::DuplicateId { table, id } => {
                write!(f, "Duplicate identifier '{}' in {}", id, table)
            }
            LoadError::UnknownTimezone(name) => write!(f, "Unknown timezone: {}", name),
            LoadError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}
