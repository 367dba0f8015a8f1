/// Flow table CSV parsing
///
/// Reads the daily-mean (Qmj) and instantaneous (Qi) export files into
/// `FlowTable`s. Both files share the same three-column layout
/// (`code_station,date,debit` by default, located by header name) and
/// differ only in how the timestamp column is normalised.
///
/// Parsing is all-or-nothing: a single unparseable timestamp or flow cell
/// fails the whole load. The export is assumed well-formed; rows are never
/// skipped silently.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use crate::analysis::series::FlowTable;
use crate::config::FieldNames;
use crate::logging;
use crate::model::{Day, FlowReading, Instant, LoadError};

/// Naive datetime layouts accepted in timestamp columns.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Timestamp normalisation
// ============================================================================

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Canonical day of a daily-mean timestamp.
///
/// Accepts a bare date, a naive datetime (time of day dropped), or an
/// RFC 3339 instant (its local calendar date is kept).
pub fn parse_daily_timestamp(raw: &str) -> Option<Day> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    parse_naive(s).map(|dt| dt.date())
}

/// Canonical instant of an instantaneous timestamp, in `tz`.
///
/// Naive timestamps are read as UTC; timestamps with an explicit offset are
/// converted from that offset.
pub fn parse_instant_timestamp(raw: &str, tz: Tz) -> Option<Instant> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }
    parse_naive(s).map(|dt| dt.and_utc().with_timezone(&tz))
}

// ============================================================================
// CSV parsing
// ============================================================================

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"'))
        .collect()
}

fn column_index(header: &[&str], table: &str, column: &str) -> Result<usize, LoadError> {
    header
        .iter()
        .position(|h| *h == column)
        .ok_or_else(|| LoadError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn parse_flow(cell: &str, table: &str, line: usize) -> Result<f64, LoadError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| LoadError::MalformedFlow {
        table: table.to_string(),
        line,
        value: cell.to_string(),
    })
}

/// Parses a flow CSV into readings, in file order.
///
/// `parse_ts` normalises the timestamp cell; a `None` aborts the load with
/// `MalformedTimestamp`.
pub fn parse_flow_csv<T>(
    text: &str,
    table: &str,
    fields: &FieldNames,
    parse_ts: impl Fn(&str) -> Option<T>,
) -> Result<Vec<FlowReading<T>>, LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines.next().ok_or_else(|| LoadError::MalformedTable {
        table: table.to_string(),
        message: "empty file".to_string(),
    })?;
    let header = split_fields(header_line);
    let code_col = column_index(&header, table, &fields.flow_station)?;
    let ts_col = column_index(&header, table, &fields.flow_timestamp)?;
    let flow_col = column_index(&header, table, &fields.flow_value)?;
    let width = code_col.max(ts_col).max(flow_col) + 1;

    let mut readings = Vec::new();
    for (line_no, line) in lines {
        let cells = split_fields(line);
        if cells.len() < width {
            return Err(LoadError::MalformedTable {
                table: table.to_string(),
                message: format!("line {} has {} fields, expected at least {}", line_no, cells.len(), width),
            });
        }

        let timestamp = parse_ts(cells[ts_col]).ok_or_else(|| LoadError::MalformedTimestamp {
            table: table.to_string(),
            line: line_no,
            value: cells[ts_col].to_string(),
        })?;

        readings.push(FlowReading {
            station_code: cells[code_col].to_string(),
            timestamp,
            flow_m3: parse_flow(cells[flow_col], table, line_no)?,
        });
    }

    Ok(readings)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn into_table<T: Ord + Copy>(table: &str, readings: Vec<FlowReading<T>>) -> FlowTable<T> {
    let rows = readings.len();
    let flows = FlowTable::from_readings(readings);
    logging::log_load_summary(table, rows, flows.kept_len(), rows - flows.kept_len());
    flows
}

// ============================================================================
// Loaders
// ============================================================================

/// Loads the daily-mean flow table.
pub fn load_daily_flows(path: impl AsRef<Path>, fields: &FieldNames) -> Result<FlowTable<Day>, LoadError> {
    let path = path.as_ref();
    let table = table_name(path);
    let readings = parse_flow_csv(&read_file(path)?, &table, fields, parse_daily_timestamp)?;
    Ok(into_table(&table, readings))
}

/// Loads the instantaneous flow table, normalised to `tz`.
pub fn load_instant_flows(
    path: impl AsRef<Path>,
    fields: &FieldNames,
    tz: Tz,
) -> Result<FlowTable<Instant>, LoadError> {
    let path = path.as_ref();
    let table = table_name(path);
    let readings = parse_flow_csv(&read_file(path)?, &table, fields, |s| parse_instant_timestamp(s, tz))?;
    Ok(into_table(&table, readings))
}

// ============================================================================
// Tests
// ============================================================================
