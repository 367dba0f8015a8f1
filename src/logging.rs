/// Structured logging for the basin status pipeline
///
/// Provides context-rich logging with a component tag, an optional
/// station / segment / unit identifier, timestamps, and severity levels.
/// Supports both console output and file-based logging.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a level name as written in configuration files.
    pub fn parse(s: &str) -> Option<LogLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Pipeline stage a log line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Config,
    Store,
    Basin,
    Classifier,
    Aggregator,
    Window,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Config => write!(f, "CFG"),
            Component::Store => write!(f, "STORE"),
            Component::Basin => write!(f, "BASIN"),
            Component::Classifier => write!(f, "CLASS"),
            Component::Aggregator => write!(f, "AGG"),
            Component::Window => write!(f, "WINDOW"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: Component, entity_id: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let entity_part = entity_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, entity_part, message)
    }

    fn log(&self, level: LogLevel, component: Component, entity_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, entity_id, message);
        let entity_part = entity_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, entity_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, entity_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", component, entity_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, component: Component, entity_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, entity_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, entity_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, entity_id, message);
}

/// Log a warning message
pub fn warn(component: Component, entity_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, entity_id, message);
}

/// Log an error message
pub fn error(component: Component, entity_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, entity_id, message);
}

/// Log a debug message
pub fn debug(component: Component, entity_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, entity_id, message);
}

// ---------------------------------------------------------------------------
// Load Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a flow table load.
///
/// Duplicate (station, timestamp) rows are expected in the source feed and
/// are discarded on purpose, so they only raise the level to a warning when
/// nothing was kept at all.
pub fn log_load_summary(table: &str, rows: usize, kept: usize, duplicates: usize) {
    let message = format!(
        "Loaded {}: {} rows, {} kept, {} duplicates discarded",
        table, rows, kept, duplicates
    );

    if kept == 0 {
        warn(Component::Store, None, &message);
    } else if duplicates > 0 {
        debug(Component::Store, None, &message);
        info(Component::Store, None, &format!("Loaded {}: {} readings", table, kept));
    } else {
        info(Component::Store, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse_accepts_config_spellings() {
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse(" warn "), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_entry_carries_component_and_entity() {
        let entry = Logger::format_entry(LogLevel::Warning, Component::Window, Some("O7001510"), "no reading");
        assert!(entry.contains("WARN WINDOW [O7001510]: no reading"), "got {}", entry);
    }

    #[test]
    fn test_file_logging_appends_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hydromon.log");
        let logger = Logger {
            min_level: LogLevel::Info,
            log_file: Some(path.to_string_lossy().into_owned()),
            console_timestamps: true,
        };
        logger.log(LogLevel::Info, Component::System, None, "first");
        logger.log(LogLevel::Debug, Component::System, None, "filtered out");
        logger.log(LogLevel::Error, Component::Store, Some("hbv_qi.csv"), "second");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO SYS: first"));
        assert!(lines[1].ends_with("ERROR STORE [hbv_qi.csv]: second"));
    }
}
