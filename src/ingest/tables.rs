/// GeoJSON entity table parsing
///
/// Station, segment and unit tables arrive as GeoJSON feature collections.
/// Only each feature's `properties` object is read; geometry is left to the
/// presentation layer. Property names come from `config::FieldNames`.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::FieldNames;
use crate::model::{LoadError, Segment, Station, Thresholds, Unit};

// ============================================================================
// GeoJSON Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

type Properties = Map<String, Value>;

fn parse_features(text: &str, table: &str) -> Result<Vec<Properties>, LoadError> {
    let collection: FeatureCollection =
        serde_json::from_str(text).map_err(|e| LoadError::MalformedTable {
            table: table.to_string(),
            message: e.to_string(),
        })?;
    Ok(collection
        .features
        .into_iter()
        .map(|f| f.properties.unwrap_or_default())
        .collect())
}

// ============================================================================
// Property Helpers
// ============================================================================

fn malformed(table: &str, row: usize, key: &str, value: &Value) -> LoadError {
    LoadError::MalformedTable {
        table: table.to_string(),
        message: format!("feature {}: property '{}' has unexpected value {}", row, key, value),
    }
}

/// Identifier-like property. Integral numbers are rendered without a
/// fractional part so that `12` and `"12"` name the same entity.
fn id_prop(props: &Properties, key: &str, table: &str, row: usize) -> Result<Option<String>, LoadError> {
    match props.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => format!("{}", f as i64),
                _ => n.to_string(),
            },
        })),
        Some(other) => Err(malformed(table, row, key, other)),
    }
}

fn required_id(props: &Properties, key: &str, table: &str, row: usize) -> Result<String, LoadError> {
    id_prop(props, key, table, row)?.ok_or_else(|| LoadError::MalformedTable {
        table: table.to_string(),
        message: format!("feature {}: missing identifier '{}'", row, key),
    })
}

/// Numeric property; null, absent and empty strings are `None`.
fn num_prop(props: &Properties, key: &str, table: &str, row: usize) -> Result<Option<f64>, LoadError> {
    let Some(value) = props.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| malformed(table, row, key, value)),
        other => Err(malformed(table, row, key, other)),
    }
}

fn text_prop(props: &Properties, key: &str) -> String {
    match props.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn check_unique<'a>(ids: impl Iterator<Item = &'a str>, table: &str) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LoadError::DuplicateId {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Entity Parsers
// ============================================================================

pub fn parse_stations(text: &str, table: &str, fields: &FieldNames) -> Result<Vec<Station>, LoadError> {
    let mut stations = Vec::new();
    for (row, props) in parse_features(text, table)?.iter().enumerate() {
        stations.push(Station {
            code: required_id(props, &fields.station_code, table, row)?,
            name: text_prop(props, &fields.station_name),
            longitude: num_prop(props, &fields.station_longitude, table, row)?,
            latitude: num_prop(props, &fields.station_latitude, table, row)?,
            thresholds: Thresholds {
                doe: num_prop(props, &fields.doe, table, row)?,
                da: num_prop(props, &fields.da, table, row)?,
                dar: num_prop(props, &fields.dar, table, row)?,
                dc: num_prop(props, &fields.dc, table, row)?,
            },
            segment_id: id_prop(props, &fields.station_segment, table, row)?,
        });
    }
    check_unique(stations.iter().map(|s| s.code.as_str()), table)?;
    Ok(stations)
}

pub fn parse_segments(text: &str, table: &str, fields: &FieldNames) -> Result<Vec<Segment>, LoadError> {
    let mut segments = Vec::new();
    for (row, props) in parse_features(text, table)?.iter().enumerate() {
        segments.push(Segment {
            id: required_id(props, &fields.segment_id, table, row)?,
            name: text_prop(props, &fields.segment_name),
            unit_id: id_prop(props, &fields.segment_unit, table, row)?,
        });
    }
    check_unique(segments.iter().map(|s| s.id.as_str()), table)?;
    Ok(segments)
}

pub fn parse_units(text: &str, table: &str, fields: &FieldNames) -> Result<Vec<Unit>, LoadError> {
    let mut units = Vec::new();
    for (row, props) in parse_features(text, table)?.iter().enumerate() {
        units.push(Unit {
            id: required_id(props, &fields.unit_id, table, row)?,
            name: text_prop(props, &fields.unit_name),
        });
    }
    check_unique(units.iter().map(|u| u.id.as_str()), table)?;
    Ok(units)
}

// ============================================================================
// File Loaders
// ============================================================================

fn read_table(path: &Path) -> Result<(String, String), LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((text, name))
}

pub fn load_stations(path: impl AsRef<Path>, fields: &FieldNames) -> Result<Vec<Station>, LoadError> {
    let (text, name) = read_table(path.as_ref())?;
    parse_stations(&text, &name, fields)
}

pub fn load_segments(path: impl AsRef<Path>, fields: &FieldNames) -> Result<Vec<Segment>, LoadError> {
    let (text, name) = read_table(path.as_ref())?;
    parse_segments(&text, &name, fields)
}

pub fn load_units(path: impl AsRef<Path>, fields: &FieldNames) -> Result<Vec<Unit>, LoadError> {
    let (text, name) = read_table(path.as_ref())?;
    parse_units(&text, &name, fields)
}

// ============================================================================
// Tests
// ============================================================================
