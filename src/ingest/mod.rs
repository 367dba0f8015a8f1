/// Source table loading.
///
/// Everything that touches the filesystem lives here and runs once, while
/// the `BasinSnapshot` is built. The classification and aggregation code
/// never performs I/O.
///
/// Submodules:
/// - `flows` — Qmj / Qi flow CSV exports into `FlowTable`s.
/// - `tables` — station, segment and unit GeoJSON tables.

pub mod flows;
pub mod tables;
