/// Read-only basin snapshot: the station registry, the segment / unit
/// hierarchy and both flow tables.
///
/// A `BasinSnapshot` is built once at startup (from files via
/// [`BasinSnapshot::load`], or from in-memory tables via
/// [`BasinSnapshot::new`]) and then passed by shared reference into every
/// status computation. Nothing mutates it after construction.

use std::collections::HashMap;

use chrono_tz::Tz;

use crate::analysis::series::FlowTable;
use crate::config::{Config, StationGroup};
use crate::ingest::{flows, tables};
use crate::logging::{self, Component};
use crate::model::{Day, Instant, LoadError, Segment, Station, Unit};

pub struct BasinSnapshot {
    stations: Vec<Station>,
    segments: Vec<Segment>,
    units: Vec<Unit>,
    daily: FlowTable<Day>,
    instant: FlowTable<Instant>,
    timezone: Tz,
    groups: Vec<StationGroup>,
    /// station code → segment id
    station_segment: HashMap<String, String>,
    /// segment id → unit id
    segment_unit: HashMap<String, String>,
}

impl BasinSnapshot {
    pub fn new(
        stations: Vec<Station>,
        segments: Vec<Segment>,
        units: Vec<Unit>,
        daily: FlowTable<Day>,
        instant: FlowTable<Instant>,
        timezone: Tz,
    ) -> Self {
        let station_segment = stations
            .iter()
            .filter_map(|s| Some((s.code.clone(), s.segment_id.clone()?)))
            .collect();
        let segment_unit = segments
            .iter()
            .filter_map(|s| Some((s.id.clone(), s.unit_id.clone()?)))
            .collect();

        let snapshot = Self {
            stations,
            segments,
            units,
            daily,
            instant,
            timezone,
            groups: Vec::new(),
            station_segment,
            segment_unit,
        };
        snapshot.report_inconsistencies();
        snapshot
    }

    /// Attaches the named station groups used by group-oriented views.
    pub fn with_groups(mut self, groups: Vec<StationGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Loads every source table named in `config`. Any malformed table
    /// aborts the whole load.
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let fields = &config.fields;
        let tz = config.reference_tz()?;

        let stations = tables::load_stations(&config.data.stations, fields)?;
        let segments = tables::load_segments(&config.data.segments, fields)?;
        let units = tables::load_units(&config.data.units, fields)?;
        let daily = flows::load_daily_flows(&config.data.daily_flows, fields)?;
        let instant = flows::load_instant_flows(&config.data.instant_flows, fields, tz)?;

        logging::info(
            Component::Basin,
            None,
            &format!(
                "Snapshot loaded: {} stations, {} segments, {} units",
                stations.len(),
                segments.len(),
                units.len()
            ),
        );

        Ok(Self::new(stations, segments, units, daily, instant, tz).with_groups(config.groups.clone()))
    }

    fn report_inconsistencies(&self) {
        for station in &self.stations {
            if let Some(seg) = &station.segment_id {
                if self.find_segment(seg).is_none() {
                    logging::warn(
                        Component::Basin,
                        Some(&station.code),
                        &format!("references unknown segment '{}'", seg),
                    );
                }
            }
        }
        for segment in &self.segments {
            if let Some(unit) = &segment.unit_id {
                if self.find_unit(unit).is_none() {
                    logging::warn(
                        Component::Basin,
                        Some(&segment.id),
                        &format!("references unknown unit '{}'", unit),
                    );
                }
            }
        }
        for code in self.misordered_thresholds() {
            logging::debug(
                Component::Basin,
                Some(code),
                "thresholds are not ordered DOE >= DA >= DAR >= DC",
            );
        }
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn groups(&self) -> &[StationGroup] {
        &self.groups
    }

    pub fn station_codes(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.code.as_str()).collect()
    }

    /// Looks up a station by code. Returns `None` if not found.
    pub fn find_station(&self, code: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.code == code)
    }

    pub fn find_segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn find_unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Unit a station ultimately belongs to, through its segment.
    pub fn unit_of_station(&self, code: &str) -> Option<&str> {
        let seg = self.station_segment.get(code)?;
        self.segment_unit.get(seg).map(String::as_str)
    }

    /// Station → segment membership relation.
    pub fn station_segments(&self) -> &HashMap<String, String> {
        &self.station_segment
    }

    /// Segment → unit membership relation.
    pub fn segment_units(&self) -> &HashMap<String, String> {
        &self.segment_unit
    }

    /// Stations whose complete threshold set violates the regulatory
    /// ordering. They are still classified, with the fixed rule order.
    pub fn misordered_thresholds(&self) -> Vec<&str> {
        self.stations
            .iter()
            .filter(|s| {
                let t = &s.thresholds;
                match (t.doe, t.da, t.dar, t.dc) {
                    (Some(doe), Some(da), Some(dar), Some(dc)) => !(doe >= da && da >= dar && dar >= dc),
                    _ => false,
                }
            })
            .map(|s| s.code.as_str())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Flow tables
    // -----------------------------------------------------------------------

    pub fn daily(&self) -> &FlowTable<Day> {
        &self.daily
    }

    pub fn instant(&self) -> &FlowTable<Instant> {
        &self.instant
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Most recent day with a daily-mean reading.
    pub fn latest_day(&self) -> Option<Day> {
        self.daily.time_extent().map(|(_, last)| last)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
