/// Command-line entry point.
///
/// Usage: `hydromon [YYYY-MM-DD]`
///
/// Loads the basin snapshot once, then reports the status of the given day
/// (default: the latest day with a daily-mean reading): the distribution of
/// station severities, the worst-case state of each unit, the stations at
/// or below DAR and their history over the configured window, and the
/// last week of instantaneous flows at the configured Qi stations.

use chrono::NaiveDate;

use hydromon::alert::thresholds::{Severity, ThresholdLevel};
use hydromon::analysis::daily::DailyStatus;
use hydromon::analysis::groupings::group_all;
use hydromon::analysis::periods::QiPeriod;
use hydromon::analysis::window::StatusWindow;
use hydromon::basin::BasinSnapshot;
use hydromon::config::Config;
use hydromon::logging::{self, Component};
use hydromon::model::LoadError;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    logging::info(
        Component::Config,
        None,
        &format!(
            "Reference timezone {}, {}-day window, {} station groups",
            config.time.reference_timezone,
            config.time.window_days,
            config.groups.len()
        ),
    );

    let basin = match BasinSnapshot::load(&config) {
        Ok(basin) => basin,
        Err(e) => {
            logging::error(Component::Basin, None, &e.to_string());
            return Err(e.into());
        }
    };

    let day = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(arg.trim(), "%Y-%m-%d")
            .map_err(|_| LoadError::Config(format!("invalid day '{}', expected YYYY-MM-DD", arg)))?,
        None => basin
            .latest_day()
            .ok_or_else(|| LoadError::Config("daily flow table is empty".to_string()))?,
    };

    let status = DailyStatus::compute(&basin, day);
    let window = StatusWindow::build(&basin, day, config.time.window_days);

    // ---- distribution ------------------------------------------------------
    let distribution = status.distribution();
    logging::info(
        Component::System,
        None,
        &format!("{}: {} stations", day, distribution.total()),
    );
    for (severity, count) in distribution.entries() {
        logging::info(
            Component::System,
            None,
            &format!(
                "  [{}] {:<26} {:>3} ({:.0}%)",
                severity.level(),
                severity.label(),
                count,
                distribution.share(severity) * 100.0
            ),
        );
    }

    // ---- units ---------------------------------------------------------------
    for unit in &status.units {
        logging::info(
            Component::Aggregator,
            Some(&unit.id),
            &format!("{} -> {}", unit.name, unit.severity),
        );
    }

    // ---- groups --------------------------------------------------------------
    for row in group_all(basin.groups(), &status) {
        if row.station.severity >= Severity::BelowDa {
            logging::warn(
                Component::Classifier,
                Some(&row.station.code),
                &format!("{} #{}: {}", row.group_name, row.position, row.station.severity),
            );
        }
    }

    // ---- DAR crossings -------------------------------------------------------
    for row in status.below_threshold(&basin, ThresholdLevel::Dar) {
        logging::warn(
            Component::Classifier,
            Some(&row.code),
            &format!("{} ({})", row, ThresholdLevel::Dar),
        );
    }

    // ---- instantaneous flows ---------------------------------------------------
    let week = basin
        .instant()
        .in_period(day, QiPeriod::Week, basin.timezone())
        .subset(config.instant_stations.as_slice());
    for code in &config.instant_stations {
        let series = week.subset(std::slice::from_ref(code));
        match series.flow_extent() {
            Some((low, high)) => logging::info(
                Component::Store,
                Some(code),
                &format!(
                    "{}: {} readings, flow range [{}, {}) m3",
                    QiPeriod::Week.label(),
                    series.kept_len(),
                    low,
                    high
                ),
            ),
            None => logging::warn(
                Component::Store,
                Some(code),
                &format!("{}: no instantaneous readings", QiPeriod::Week.label()),
            ),
        }
    }

    let crossed = window.crossed_level(ThresholdLevel::Dar);
    for row in &crossed {
        logging::debug(
            Component::Window,
            Some(&row.station_code),
            &format!("{} {}", row.day, row.severity),
        );
    }
    logging::info(
        Component::Window,
        None,
        &format!(
            "{} station-days over the last {} days for stations at or below DAR",
            crossed.len(),
            window.days().len()
        ),
    );

    Ok(())
}
