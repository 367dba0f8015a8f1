//! Long-format flow tables and their per-station views.
//!
//! A [`FlowTable`] holds the raw readings of one series kind (daily or
//! instantaneous) exactly as loaded, plus a per-station index used for
//! lookups. The index keeps the FIRST reading seen for each
//! (station, timestamp) pair; later duplicates stay in the raw rows but are
//! never returned by `extract`, `value_at` or `pivot`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeBounds;

use crate::model::FlowReading;

#[derive(Debug, Clone)]
pub struct FlowTable<T> {
    readings: Vec<FlowReading<T>>,
    index: HashMap<String, BTreeMap<T, f64>>,
    /// Station codes in order of first appearance.
    station_order: Vec<String>,
}

/// Timestamp-indexed wide table, one column per requested station.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable<T> {
    pub stations: Vec<String>,
    pub rows: Vec<PivotRow<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow<T> {
    pub timestamp: T,
    /// One cell per entry of `PivotTable::stations`; `None` where that
    /// station has no reading at this timestamp.
    pub values: Vec<Option<f64>>,
}

impl<T: Ord + Copy> FlowTable<T> {
    pub fn from_readings(readings: Vec<FlowReading<T>>) -> Self {
        let mut index: HashMap<String, BTreeMap<T, f64>> = HashMap::new();
        let mut station_order = Vec::new();

        for r in &readings {
            index
                .entry(r.station_code.clone())
                .or_insert_with(|| {
                    station_order.push(r.station_code.clone());
                    BTreeMap::new()
                })
                .entry(r.timestamp)
                .or_insert(r.flow_m3);
        }

        Self { readings, index, station_order }
    }

    /// Raw rows, in load order, duplicates included.
    pub fn readings(&self) -> &[FlowReading<T>] {
        &self.readings
    }

    /// Number of raw rows.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of distinct (station, timestamp) pairs.
    pub fn kept_len(&self) -> usize {
        self.index.values().map(BTreeMap::len).sum()
    }

    /// Station codes in order of first appearance.
    pub fn stations(&self) -> &[String] {
        &self.station_order
    }

    pub fn contains_station(&self, station: &str) -> bool {
        self.index.contains_key(station)
    }

    /// Deduplicated series of one station, ordered by timestamp.
    /// Empty when the station has no readings.
    pub fn extract(&self, station: &str) -> BTreeMap<T, f64> {
        self.index.get(station).cloned().unwrap_or_default()
    }

    /// The kept reading of `station` at exactly `timestamp`.
    pub fn value_at(&self, station: &str, timestamp: &T) -> Option<f64> {
        self.index.get(station).and_then(|s| s.get(timestamp)).copied()
    }

    /// Wide view of the requested stations aligned on the union of their
    /// timestamps. Missing cells are `None`, never interpolated.
    pub fn pivot<S: AsRef<str>>(&self, stations: &[S]) -> PivotTable<T> {
        let series: Vec<Option<&BTreeMap<T, f64>>> =
            stations.iter().map(|s| self.index.get(s.as_ref())).collect();

        let timestamps: BTreeSet<T> = series
            .iter()
            .flatten()
            .flat_map(|s| s.keys().copied())
            .collect();

        let rows = timestamps
            .into_iter()
            .map(|timestamp| PivotRow {
                timestamp,
                values: series
                    .iter()
                    .map(|s| s.and_then(|m| m.get(&timestamp)).copied())
                    .collect(),
            })
            .collect();

        PivotTable {
            stations: stations.iter().map(|s| s.as_ref().to_string()).collect(),
            rows,
        }
    }

    fn retain(&self, keep: impl Fn(&FlowReading<T>) -> bool) -> Self {
        Self::from_readings(self.readings.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Rows of the given stations only.
    pub fn subset<S: AsRef<str>>(&self, stations: &[S]) -> Self {
        self.retain(|r| stations.iter().any(|s| s.as_ref() == r.station_code))
    }

    /// Rows whose flow lies in `[low, high)`. NaN flows are dropped.
    pub fn filter_flow(&self, low: f64, high: f64) -> Self {
        self.retain(|r| r.flow_m3 >= low && r.flow_m3 < high)
    }

    /// Rows whose timestamp lies in `range`.
    pub fn filter_time(&self, range: impl RangeBounds<T>) -> Self {
        self.retain(|r| range.contains(&r.timestamp))
    }

    /// Integer bounds for a flow range picker: `(round(min), round(max) + 1)`,
    /// rounding half to even. Taken over the raw rows, duplicates included,
    /// so the picker spans every value present in the export. `None`
    /// without any numeric flow.
    pub fn flow_extent(&self) -> Option<(i64, i64)> {
        let mut flows = self.readings.iter().map(|r| r.flow_m3).filter(|f| !f.is_nan());
        let first = flows.next()?;
        let (min, max) = flows.fold((first, first), |(lo, hi), f| (lo.min(f), hi.max(f)));
        Some((min.round_ties_even() as i64, (max.round_ties_even() + 1.0) as i64))
    }

    /// Earliest and latest timestamps present.
    pub fn time_extent(&self) -> Option<(T, T)> {
        let mut stamps = self.readings.iter().map(|r| r.timestamp);
        let first = stamps.next()?;
        Some(stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

impl<T> PivotTable<T> {
    /// Cells of one station, in row order.
    pub fn column(&self, station: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.stations.iter().position(|s| s == station)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }
}

impl<T: PartialEq> PivotTable<T> {
    pub fn row(&self, timestamp: &T) -> Option<&PivotRow<T>> {
        self.rows.iter().find(|r| &r.timestamp == timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, d).unwrap()
    }

    fn reading(code: &str, d: u32, flow: f64) -> FlowReading<NaiveDate> {
        FlowReading { station_code: code.to_string(), timestamp: day(d), flow_m3: flow }
    }

    fn sample() -> FlowTable<NaiveDate> {
        FlowTable::from_readings(vec![
            reading("B", 2, 20.0),
            reading("A", 3, 3.0),
            reading("A", 1, 1.0),
            reading("B", 1, 10.0),
            reading("A", 3, 99.0), // duplicate, discarded
        ])
    }

    // --- extract ------------------------------------------------------------

    #[test]
    fn test_extract_orders_by_timestamp_and_keeps_first_duplicate() {
        let a = sample().extract("A");
        let pairs: Vec<_> = a.into_iter().collect();
        assert_eq!(pairs, vec![(day(1), 1.0), (day(3), 3.0)]);
    }

    #[test]
    fn test_extract_unknown_station_is_empty() {
        assert!(sample().extract("Z").is_empty());
    }

    #[test]
    fn test_stations_in_first_seen_order() {
        assert_eq!(sample().stations(), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_raw_rows_survive_deduplication() {
        let t = sample();
        assert_eq!(t.len(), 5);
        assert_eq!(t.kept_len(), 4);
    }

    // --- pivot --------------------------------------------------------------

    #[test]
    fn test_pivot_aligns_on_union_of_timestamps() {
        let p = sample().pivot(&["A", "B"]);
        let stamps: Vec<_> = p.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![day(1), day(2), day(3)]);
        assert_eq!(p.column("A").unwrap(), vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(p.column("B").unwrap(), vec![Some(10.0), Some(20.0), None]);
        assert_eq!(p.row(&day(2)).unwrap().values, vec![None, Some(20.0)]);
    }

    #[test]
    fn test_pivot_with_unknown_station_gives_empty_column() {
        let p = sample().pivot(&["A", "Z"]);
        assert_eq!(p.column("Z").unwrap(), vec![None, None]);
    }

    // --- filters ------------------------------------------------------------

    #[test]
    fn test_subset_and_filters() {
        let t = sample();
        assert_eq!(t.subset(&["B"]).len(), 2);
        assert_eq!(t.filter_flow(3.0, 20.0).len(), 2, "[3, 20) keeps 3 and 10");
        assert_eq!(t.filter_time(day(2)..=day(3)).len(), 3);
    }

    #[test]
    fn test_flow_filter_drops_nan() {
        let t = FlowTable::from_readings(vec![reading("A", 1, f64::NAN), reading("A", 2, 1.0)]);
        assert_eq!(t.filter_flow(0.0, 10.0).len(), 1);
    }

    #[test]
    fn test_flow_extent_rounds_half_to_even() {
        let t = FlowTable::from_readings(vec![
            reading("A", 1, 2.5),
            reading("A", 2, f64::NAN),
            reading("A", 3, 10.4),
        ]);
        assert_eq!(t.flow_extent(), Some((2, 11)));
        assert_eq!(t.time_extent(), Some((day(1), day(3))));
    }

    #[test]
    fn test_flow_extent_includes_discarded_duplicates() {
        let t = FlowTable::from_readings(vec![reading("A", 1, 4.0), reading("A", 1, 0.4), reading("A", 2, 6.6)]);
        assert_eq!(t.value_at("A", &day(1)), Some(4.0));
        assert_eq!(t.flow_extent(), Some((0, 8)));
    }

    #[test]
    fn test_flow_extent_of_empty_table_is_none() {
        let t: FlowTable<NaiveDate> = FlowTable::from_readings(Vec::new());
        assert_eq!(t.flow_extent(), None);
        assert_eq!(t.time_extent(), None);
    }

    // --- Properties ---------------------------------------------------------

    proptest! {
        #[test]
        fn prop_first_duplicate_wins_regardless_of_other_rows(
            first in -100.0..100.0f64,
            second in -100.0..100.0f64,
            noise in proptest::collection::vec((0u32..3, 1u32..28, 0.0..50.0f64), 0..20),
            split in 0usize..20,
        ) {
            let others = ["X", "Y", "Z"];
            let mut rows: Vec<_> = noise
                .iter()
                .map(|&(s, d, f)| reading(others[s as usize], d, f))
                .collect();
            let at = split.min(rows.len());
            rows.insert(at, reading("A", 15, first));
            rows.push(reading("A", 15, second));

            let t = FlowTable::from_readings(rows);
            prop_assert_eq!(t.value_at("A", &day(15)), Some(first));
            prop_assert_eq!(t.extract("A").len(), 1);
        }
    }
}
