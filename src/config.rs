//! Service configuration.
//!
//! Configuration is read from a TOML file whose path comes from the
//! `HYDROMON_CONFIG` environment variable (a `.env` file is honoured),
//! falling back to `hydromon.toml` in the working directory.
//!
//! ```toml
//! instant_stations = ["O7041510", "O7101510"]
//!
//! [data]
//! stations = "data/stations.geojson"
//! segments = "data/hydrographie.geojson"
//! units = "data/ss-unites-gestion.geojson"
//! daily_flows = "data/hbv_qmj.csv"
//! instant_flows = "data/hbv_qi.csv"
//!
//! [time]
//! reference_timezone = "Europe/Paris"
//! window_days = 7
//!
//! [[groups]]
//! name = "Colagne"
//! stations = ["O7054010", "O7074020", "O7094010"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::alert::thresholds::ThresholdLevel;
use crate::logging::LogLevel;
use crate::model::LoadError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "HYDROMON_CONFIG";

/// Used when `HYDROMON_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "hydromon.toml";

/// Longest accepted status window: one leap year.
pub const MAX_WINDOW_DAYS: usize = 366;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataPaths,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Named station groups (rivers), in display order.
    #[serde(default)]
    pub groups: Vec<StationGroup>,
    /// Stations offered for instantaneous-flow views.
    #[serde(default)]
    pub instant_stations: Vec<String>,
}

/// Locations of the five source tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub stations: String,
    pub segments: String,
    pub units: String,
    pub daily_flows: String,
    pub instant_flows: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// IANA name of the zone instantaneous readings are expressed in.
    pub reference_timezone: String,
    /// Look-back window of the status history, in days.
    pub window_days: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            reference_timezone: "Europe/Paris".to_string(),
            window_days: 7,
        }
    }
}

/// Column and property names in the source tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub station_code: String,
    pub station_name: String,
    pub station_segment: String,
    pub station_longitude: String,
    pub station_latitude: String,
    pub doe: String,
    pub da: String,
    pub dar: String,
    pub dc: String,
    pub segment_id: String,
    pub segment_name: String,
    pub segment_unit: String,
    pub unit_id: String,
    pub unit_name: String,
    pub flow_station: String,
    pub flow_timestamp: String,
    pub flow_value: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            station_code: "COD_STAT".to_string(),
            station_name: "NOM_COMPLET".to_string(),
            station_segment: "ID_hydrographie".to_string(),
            station_longitude: "X_LONG_E".to_string(),
            station_latitude: "Y_LAT_N".to_string(),
            doe: "Q_Obj_m3".to_string(),
            da: "Q_80pDOE_m3".to_string(),
            dar: "Q_alerte_renf".to_string(),
            dc: "Q_Crise_m3".to_string(),
            segment_id: "ID_hydrographie".to_string(),
            segment_name: "hydrographie".to_string(),
            segment_unit: "ID_ss-unite-gestion".to_string(),
            unit_id: "ID_ss-unite-gestion".to_string(),
            unit_name: "Unite_Gestion".to_string(),
            flow_station: "code_station".to_string(),
            flow_timestamp: "date".to_string(),
            flow_value: "debit".to_string(),
        }
    }
}

impl FieldNames {
    /// Station property holding the given threshold.
    pub fn threshold_field(&self, level: ThresholdLevel) -> &str {
        match level {
            ThresholdLevel::Doe => &self.doe,
            ThresholdLevel::Da => &self.da,
            ThresholdLevel::Dar => &self.dar,
            ThresholdLevel::Dc => &self.dc,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

/// A named logical grouping of stations, typically one river.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StationGroup {
    pub name: String,
    pub stations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Config, LoadError> {
        let config: Config =
            toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `.env`, then the file named by `HYDROMON_CONFIG`.
    pub fn from_env() -> Result<Config, LoadError> {
        dotenv::dotenv().ok();
        let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.time.window_days == 0 {
            return Err(LoadError::Config("time.window_days must be at least 1".to_string()));
        }
        if self.time.window_days > MAX_WINDOW_DAYS {
            return Err(LoadError::Config(format!(
                "time.window_days is {}, at most {} allowed",
                self.time.window_days, MAX_WINDOW_DAYS
            )));
        }
        self.reference_tz()?;
        self.log_level()?;

        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(LoadError::Config("group with empty name".to_string()));
            }
            if !seen.insert(group.name.as_str()) {
                return Err(LoadError::Config(format!("duplicate group '{}'", group.name)));
            }
        }
        Ok(())
    }

    pub fn reference_tz(&self) -> Result<Tz, LoadError> {
        let name = self.time.reference_timezone.trim();
        name.parse::<Tz>()
            .map_err(|_| LoadError::UnknownTimezone(name.to_string()))
    }

    pub fn log_level(&self) -> Result<LogLevel, LoadError> {
        LogLevel::parse(&self.logging.level)
            .ok_or_else(|| LoadError::Config(format!("unknown log level '{}'", self.logging.level)))
    }

    /// Looks up a group by name.
    pub fn group(&self, name: &str) -> Option<&StationGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [data]
        stations = "stations.geojson"
        segments = "hydrographie.geojson"
        units = "ug.geojson"
        daily_flows = "qmj.csv"
        instant_flows = "qi.csv"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(MINIMAL).expect("minimal config should parse");
        assert_eq!(config.time.window_days, 7);
        assert_eq!(config.reference_tz().unwrap(), chrono_tz::Europe::Paris);
        assert_eq!(config.fields.station_code, "COD_STAT");
        assert_eq!(config.fields.threshold_field(ThresholdLevel::Dar), "Q_alerte_renf");
        assert_eq!(config.log_level().unwrap(), LogLevel::Info);
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_groups_keep_file_order() {
        let text = format!(
            "{}\n[[groups]]\nname = \"Lot amont\"\nstations = [\"O7001510\", \"O7021530\"]\n\n\
             [[groups]]\nname = \"Célé\"\nstations = [\"O8113520\"]\n",
            MINIMAL
        );
        let config = Config::from_toml_str(&text).unwrap();
        let names: Vec<_> = config.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Lot amont", "Célé"]);
        assert_eq!(config.group("Célé").unwrap().stations, vec!["O8113520"]);
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let text = format!("{}\n[time]\nwindow_days = 0\n", MINIMAL);
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, LoadError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_window_longer_than_a_year_is_rejected() {
        let text = format!("{}\n[time]\nwindow_days = 7000000\n", MINIMAL);
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, LoadError::Config(_)), "got {:?}", err);

        let text = format!("{}\n[time]\nwindow_days = {}\n", MINIMAL, MAX_WINDOW_DAYS);
        assert_eq!(Config::from_toml_str(&text).unwrap().time.window_days, MAX_WINDOW_DAYS);
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let text = format!("{}\n[time]\nreference_timezone = \"Europe/Atlantis\"\n", MINIMAL);
        let err = Config::from_toml_str(&text).unwrap_err();
        assert_eq!(err, LoadError::UnknownTimezone("Europe/Atlantis".to_string()));
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let text = format!(
            "{}\n[[groups]]\nname = \"Colagne\"\nstations = []\n[[groups]]\nname = \"Colagne\"\nstations = []\n",
            MINIMAL
        );
        assert!(Config::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_missing_data_section_is_config_error() {
        let err = Config::from_toml_str("[time]\nwindow_days = 7\n").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.data.daily_flows, "qmj.csv");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/hydromon.toml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
