/// Hydrometric status pipeline for a river basin.
///
/// Loads station, segment and unit tables plus daily (Qmj) and
/// instantaneous (Qi) flows, classifies each station against its low-flow
/// thresholds and rolls the worst case up to segments and units.
///
/// Modules:
/// - `model` — shared record types and the load error.
/// - `config` — TOML configuration and environment overrides.
/// - `logging` — console/file logger with per-component tags.
/// - `ingest` — flow CSV and GeoJSON property table loaders.
/// - `basin` — the immutable snapshot every computation reads from.
/// - `alert` — severity scale, classifier and map palette.
/// - `analysis` — daily status, roll-up, rolling window, groupings.

pub mod alert;
pub mod analysis;
pub mod basin;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
