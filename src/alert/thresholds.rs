//! Low-flow threshold classification.
//!
//! A station's flow on a given day is compared against its four regulatory
//! thresholds (DOE, DA, DAR, DC) and mapped to a [`Severity`]. Segment and
//! unit severities are derived from these in `analysis::aggregation`.

use std::fmt;

use crate::model::Thresholds;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Low-flow severity levels, in ascending order of severity.
///
/// The discriminants are the public 0–5 scale used by the dashboard.
/// `NoInformation` sorts lowest, so taking the max over a set of stations
/// ignores stations without data as long as one of them has some.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Thresholds unavailable or reading missing.
    #[default]
    NoInformation = 0,
    /// Flow at or above DOE.
    AboveDoe = 1,
    /// Below DOE, at or above DA.
    BelowDoe = 2,
    /// Below DA, at or above DAR.
    BelowDa = 3,
    /// Below DAR, at or above DC.
    BelowDar = 4,
    /// Below DC: crisis.
    BelowDc = 5,
}

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::NoInformation,
        Severity::AboveDoe,
        Severity::BelowDoe,
        Severity::BelowDa,
        Severity::BelowDar,
        Severity::BelowDc,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Severity::level`]. Returns `None` above 5.
    pub fn from_level(level: u8) -> Option<Severity> {
        Severity::ALL.get(level as usize).copied()
    }

    /// Short category label, as used for distribution charts.
    pub fn label(self) -> &'static str {
        match self {
            Severity::NoInformation => "Sans information",
            Severity::AboveDoe => "Au-dessus DOE",
            Severity::BelowDoe => "Sous DOE",
            Severity::BelowDa => "Sous DA",
            Severity::BelowDar => "Sous DAR",
            Severity::BelowDc => "Sous DC",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

// ---------------------------------------------------------------------------
// Threshold levels
// ---------------------------------------------------------------------------

/// One of the four regulatory thresholds, used to select "stations below X".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdLevel {
    Doe,
    Da,
    Dar,
    Dc,
}

impl ThresholdLevel {
    pub const ALL: [ThresholdLevel; 4] = [
        ThresholdLevel::Doe,
        ThresholdLevel::Da,
        ThresholdLevel::Dar,
        ThresholdLevel::Dc,
    ];

    /// Lowest severity meaning "below this threshold".
    pub fn severity(self) -> Severity {
        match self {
            ThresholdLevel::Doe => Severity::BelowDoe,
            ThresholdLevel::Da => Severity::BelowDa,
            ThresholdLevel::Dar => Severity::BelowDar,
            ThresholdLevel::Dc => Severity::BelowDc,
        }
    }

    /// Picks this level's value out of a station's threshold set.
    pub fn value_in(self, thresholds: &Thresholds) -> Option<f64> {
        match self {
            ThresholdLevel::Doe => thresholds.doe,
            ThresholdLevel::Da => thresholds.da,
            ThresholdLevel::Dar => thresholds.dar,
            ThresholdLevel::Dc => thresholds.dc,
        }
    }

    /// Parses "DOE", "DA", "DAR" or "DC" (case-insensitive).
    pub fn parse(s: &str) -> Option<ThresholdLevel> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOE" => Some(ThresholdLevel::Doe),
            "DA" => Some(ThresholdLevel::Da),
            "DAR" => Some(ThresholdLevel::Dar),
            "DC" => Some(ThresholdLevel::Dc),
            _ => None,
        }
    }
}

impl fmt::Display for ThresholdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdLevel::Doe => write!(f, "DOE"),
            ThresholdLevel::Da => write!(f, "DA"),
            ThresholdLevel::Dar => write!(f, "DAR"),
            ThresholdLevel::Dc => write!(f, "DC"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies a flow value against four thresholds.
///
/// Any NaN input yields `NoInformation`. Otherwise the first matching rule
/// wins, in this fixed order:
///
/// ```text
/// flow >= doe          -> 1
/// da  <= flow < doe    -> 2
/// dar <= flow < da     -> 3
/// dc  <= flow < dar    -> 4
/// flow < dc            -> 5
/// ```
///
/// Equality at a boundary lands in the healthier band. Threshold sets that
/// violate `doe >= da >= dar >= dc` are evaluated in the same order and are
/// not rejected.
pub fn classify(flow: f64, doe: f64, da: f64, dar: f64, dc: f64) -> Severity {
    if [flow, doe, da, dar, dc].iter().any(|v| v.is_nan()) {
        return Severity::NoInformation;
    }

    if flow >= doe {
        Severity::AboveDoe
    } else if flow < doe && flow >= da {
        Severity::BelowDoe
    } else if flow < da && flow >= dar {
        Severity::BelowDa
    } else if flow < dar && flow >= dc {
        Severity::BelowDar
    } else if flow < dc {
        Severity::BelowDc
    } else {
        Severity::NoInformation
    }
}

impl Thresholds {
    /// Classifies an optional reading against this threshold set.
    /// Missing values are treated as NaN.
    pub fn classify(&self, flow: Option<f64>) -> Severity {
        let nan = f64::NAN;
        classify(
            flow.unwrap_or(nan),
            self.doe.unwrap_or(nan),
            self.da.unwrap_or(nan),
            self.dar.unwrap_or(nan),
            self.dc.unwrap_or(nan),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
