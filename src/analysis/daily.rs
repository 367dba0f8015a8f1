//! Basin status on a single day.
//!
//! [`LevelStatuses`] is the bare classification + roll-up for one day and
//! is what the window builder repeats. [`DailyStatus`] decorates it with
//! flows, names and map colours for the day view, and derives the status
//! distribution and the "stations below threshold" table.

use std::fmt;

use crate::alert::colors::{status_color, ColorTier, MapColor};
use crate::alert::thresholds::{Severity, ThresholdLevel};
use crate::analysis::aggregation::{roll_up, StatusMap};
use crate::basin::BasinSnapshot;
use crate::logging::{self, Component};
use crate::model::Day;

// ---------------------------------------------------------------------------
// Per-level severities
// ---------------------------------------------------------------------------

/// Severity of every station, segment and unit on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStatuses {
    pub stations: StatusMap,
    pub segments: StatusMap,
    pub units: StatusMap,
}

/// Daily-mean flow of a station on `day`; NaN cells count as missing.
fn flow_on(basin: &BasinSnapshot, code: &str, day: &Day) -> Option<f64> {
    basin.daily().value_at(code, day).filter(|f| !f.is_nan())
}

impl LevelStatuses {
    /// Classifies every station on `day` and rolls the result up to
    /// segments, then units.
    pub fn compute(basin: &BasinSnapshot, day: Day) -> Self {
        let stations: StatusMap = basin
            .stations()
            .iter()
            .map(|s| (s.code.clone(), s.thresholds.classify(flow_on(basin, &s.code, &day))))
            .collect();

        let segments = roll_up(
            basin.segments().iter().map(|s| s.id.as_str()),
            &stations,
            basin.station_segments(),
        );
        let units = roll_up(
            basin.units().iter().map(|u| u.id.as_str()),
            &segments,
            basin.segment_units(),
        );

        Self { stations, segments, units }
    }
}

// ---------------------------------------------------------------------------
// Day view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StationDay {
    pub code: String,
    pub name: String,
    pub flow_m3: Option<f64>,
    pub severity: Severity,
    pub fill: MapColor,
    /// Outline, drawn in the segment tier of the same severity.
    pub stroke: MapColor,
}

/// A segment or unit on the day view.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDay {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub color: MapColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStatus {
    pub day: Day,
    pub stations: Vec<StationDay>,
    pub segments: Vec<AreaDay>,
    pub units: Vec<AreaDay>,
}

/// A row of the "stations below a threshold" table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRow {
    pub code: String,
    pub name: String,
    pub flow_m3: Option<f64>,
    pub threshold_m3: Option<f64>,
    pub segment_id: Option<String>,
    pub unit_id: Option<String>,
}

fn volume(value: Option<f64>) -> String {
    value.map_or("n/a".to_string(), |v| format!("{:.3} m3", v))
}

impl fmt::Display for ThresholdRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: flow {}, threshold {}",
            self.name,
            volume(self.flow_m3),
            volume(self.threshold_m3)
        )
    }
}

/// Number of stations per severity on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusDistribution {
    counts: [usize; 6],
}

impl StatusDistribution {
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut counts = [0; 6];
        for s in severities {
            counts[s.level() as usize] += 1;
        }
        Self { counts }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.level() as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Fraction of stations at `severity`; 0 when there are none at all.
    pub fn share(&self, severity: Severity) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(severity) as f64 / total as f64,
        }
    }

    /// Categories in chart order: healthy to crisis, then no information.
    pub fn entries(&self) -> Vec<(Severity, usize)> {
        let mut order: Vec<Severity> = Severity::ALL[1..].to_vec();
        order.push(Severity::NoInformation);
        order.into_iter().map(|s| (s, self.count(s))).collect()
    }
}

impl DailyStatus {
    pub fn compute(basin: &BasinSnapshot, day: Day) -> Self {
        let levels = LevelStatuses::compute(basin, day);

        let stations: Vec<StationDay> = basin
            .stations()
            .iter()
            .map(|s| {
                let severity = levels.stations.get(&s.code).copied().unwrap_or_default();
                StationDay {
                    code: s.code.clone(),
                    name: s.name.clone(),
                    flow_m3: flow_on(basin, &s.code, &day),
                    severity,
                    fill: status_color(severity, ColorTier::Station),
                    stroke: status_color(severity, ColorTier::Segment),
                }
            })
            .collect();

        let segments = basin
            .segments()
            .iter()
            .map(|s| area(&s.id, &s.name, &levels.segments, ColorTier::Segment))
            .collect();
        let units = basin
            .units()
            .iter()
            .map(|u| area(&u.id, &u.name, &levels.units, ColorTier::Unit))
            .collect();

        let missing = stations.iter().filter(|s| s.severity == Severity::NoInformation).count();
        if missing > 0 {
            logging::debug(
                Component::Classifier,
                None,
                &format!("{}: {} of {} stations without information", day, missing, stations.len()),
            );
        }

        Self { day, stations, segments, units }
    }

    pub fn station(&self, code: &str) -> Option<&StationDay> {
        self.stations.iter().find(|s| s.code == code)
    }

    /// Flow of the day at one station.
    pub fn flow_of(&self, code: &str) -> Option<f64> {
        self.station(code).and_then(|s| s.flow_m3)
    }

    /// Day rows of the selected stations, in selection order.
    pub fn selected<S: AsRef<str>>(&self, codes: &[S]) -> Vec<&StationDay> {
        codes.iter().filter_map(|c| self.station(c.as_ref())).collect()
    }

    pub fn distribution(&self) -> StatusDistribution {
        StatusDistribution::from_severities(self.stations.iter().map(|s| s.severity))
    }

    /// Stations at or beyond `level` on this day, in registry order.
    pub fn below_threshold(&self, basin: &BasinSnapshot, level: ThresholdLevel) -> Vec<ThresholdRow> {
        self.stations
            .iter()
            .filter(|s| s.severity >= level.severity())
            .filter_map(|s| {
                let station = basin.find_station(&s.code)?;
                Some(ThresholdRow {
                    code: s.code.clone(),
                    name: s.name.clone(),
                    flow_m3: s.flow_m3,
                    threshold_m3: level.value_in(&station.thresholds),
                    segment_id: station.segment_id.clone(),
                    unit_id: basin.unit_of_station(&s.code).map(String::from),
                })
            })
            .collect()
    }
}

fn area(id: &str, name: &str, statuses: &StatusMap, tier: ColorTier) -> AreaDay {
    let severity = statuses.get(id).copied().unwrap_or_default();
    AreaDay {
        id: id.to_string(),
        name: name.to_string(),
        severity,
        color: status_color(severity, tier),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::series::FlowTable;
    use crate::model::{FlowReading, Segment, Station, Thresholds, Unit};
    use chrono::NaiveDate;
    use chrono_tz::Europe::Paris;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, 10).unwrap()
    }

    fn station(code: &str, segment: &str, thresholds: Thresholds) -> Station {
        Station {
            code: code.to_string(),
            name: format!("Station {}", code),
            longitude: None,
            latitude: None,
            thresholds,
            segment_id: Some(segment.to_string()),
        }
    }

    fn standard() -> Thresholds {
        Thresholds { doe: Some(10.0), da: Some(7.0), dar: Some(4.0), dc: Some(2.0) }
    }

    /// A (5.0, below DA) and B (1.0, below DC) on S1; C without thresholds
    /// on S2; D without reading on S1. S1, S2 in U1; S3 empty in U2.
    fn basin() -> BasinSnapshot {
        let stations = vec![
            station("A", "S1", standard()),
            station("B", "S1", standard()),
            station("C", "S2", Thresholds::default()),
            station("D", "S1", standard()),
        ];
        let segments = vec![
            Segment { id: "S1".into(), name: "Lot".into(), unit_id: Some("U1".into()) },
            Segment { id: "S2".into(), name: "Colagne".into(), unit_id: Some("U1".into()) },
            Segment { id: "S3".into(), name: "Célé".into(), unit_id: Some("U2".into()) },
        ];
        let units = vec![
            Unit { id: "U1".into(), name: "Lot amont".into() },
            Unit { id: "U2".into(), name: "Célé".into() },
        ];
        let r = |code: &str, flow| FlowReading { station_code: code.to_string(), timestamp: day(), flow_m3: flow };
        let daily = FlowTable::from_readings(vec![r("A", 5.0), r("B", 1.0), r("C", 50.0)]);
        BasinSnapshot::new(stations, segments, units, daily, FlowTable::from_readings(Vec::new()), Paris)
    }

    #[test]
    fn test_level_statuses_roll_up_worst_case() {
        let levels = LevelStatuses::compute(&basin(), day());
        assert_eq!(levels.stations["A"], Severity::BelowDa);
        assert_eq!(levels.stations["B"], Severity::BelowDc);
        assert_eq!(levels.stations["C"], Severity::NoInformation, "no thresholds");
        assert_eq!(levels.stations["D"], Severity::NoInformation, "no reading");
        assert_eq!(levels.segments["S1"], Severity::BelowDc);
        assert_eq!(levels.segments["S2"], Severity::NoInformation);
        assert_eq!(levels.segments["S3"], Severity::NoInformation);
        assert_eq!(levels.units["U1"], Severity::BelowDc);
        assert_eq!(levels.units["U2"], Severity::NoInformation);
    }

    #[test]
    fn test_day_view_colors_follow_tiers() {
        let view = DailyStatus::compute(&basin(), day());
        let b = view.station("B").unwrap();
        assert_eq!(b.fill.rgb, [39, 39, 39]);
        assert_eq!(b.stroke.rgb, [-11, -11, -11]);
        let u2 = view.units.iter().find(|u| u.id == "U2").unwrap();
        assert_eq!(u2.color.to_vec(), vec![239, 256, 267, 100]);
    }

    #[test]
    fn test_flow_of_selected_stations() {
        let view = DailyStatus::compute(&basin(), day());
        assert_eq!(view.flow_of("A"), Some(5.0));
        assert_eq!(view.flow_of("D"), None);
        let codes: Vec<_> = view.selected(&["C", "A", "Z"]).iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "A"]);
    }

    #[test]
    fn test_distribution_counts_and_shares() {
        let dist = DailyStatus::compute(&basin(), day()).distribution();
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.count(Severity::NoInformation), 2);
        assert_eq!(dist.count(Severity::BelowDa), 1);
        assert_eq!(dist.share(Severity::BelowDc), 0.25);
        let order: Vec<u8> = dist.entries().iter().map(|(s, _)| s.level()).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn test_threshold_row_reports_volumes_in_m3() {
        let row = ThresholdRow {
            code: "A".into(),
            name: "Le Lot à Mende".into(),
            flow_m3: Some(1.5),
            threshold_m3: None,
            segment_id: None,
            unit_id: None,
        };
        assert_eq!(row.to_string(), "Le Lot à Mende: flow 1.500 m3, threshold n/a");
    }

    #[test]
    fn test_empty_distribution_has_zero_shares() {
        let dist = StatusDistribution::default();
        assert_eq!(dist.share(Severity::AboveDoe), 0.0);
    }

    #[test]
    fn test_below_threshold_table() {
        let b = basin();
        let view = DailyStatus::compute(&b, day());

        let below_da = view.below_threshold(&b, ThresholdLevel::Da);
        let codes: Vec<_> = below_da.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(below_da[0].threshold_m3, Some(7.0));
        assert_eq!(below_da[0].segment_id.as_deref(), Some("S1"));
        assert_eq!(below_da[0].unit_id.as_deref(), Some("U1"));

        let below_dc = view.below_threshold(&b, ThresholdLevel::Dc);
        assert_eq!(below_dc.len(), 1);
        assert_eq!(below_dc[0].flow_m3, Some(1.0));
    }
}
