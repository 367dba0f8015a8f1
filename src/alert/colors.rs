//! Severity → map colour mapping.
//!
//! The presentation layer paints stations, segments and units with a fixed
//! palette keyed on severity. Segments use the palette darkened by 50 per
//! channel; units use it lightened by 50 with a fixed alpha of 100.
//!
//! Channel arithmetic is not clamped: black (39) darkened gives -11 and the
//! lightest greens and greys exceed 255. [`MapColor::clamped`] is available
//! for renderers that need a valid byte range.

use crate::alert::thresholds::Severity;

const SEGMENT_OFFSET: i16 = -50;
const UNIT_OFFSET: i16 = 50;
const UNIT_ALPHA: i16 = 100;

/// Which layer of the map a colour is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTier {
    Station,
    Segment,
    Unit,
}

/// An RGB colour with optional alpha, channels as computed (possibly out of
/// the 0–255 range).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapColor {
    pub rgb: [i16; 3],
    pub alpha: Option<i16>,
}

impl MapColor {
    /// Channels as a flat list, alpha appended when present.
    pub fn to_vec(&self) -> Vec<i16> {
        let mut v = self.rgb.to_vec();
        v.extend(self.alpha);
        v
    }

    /// Channels clamped into 0–255, alpha defaulting to opaque.
    pub fn clamped(&self) -> [u8; 4] {
        let c = |x: i16| x.clamp(0, 255) as u8;
        [
            c(self.rgb[0]),
            c(self.rgb[1]),
            c(self.rgb[2]),
            c(self.alpha.unwrap_or(255)),
        ]
    }
}

fn base_rgb(severity: Severity) -> [i16; 3] {
    match severity {
        Severity::AboveDoe => [136, 206, 51],
        Severity::BelowDoe => [245, 220, 11],
        Severity::BelowDa => [245, 134, 11],
        Severity::BelowDar => [229, 62, 29],
        Severity::BelowDc => [39, 39, 39],
        Severity::NoInformation => [189, 206, 217],
    }
}

/// Colour for a severity on the given map layer.
pub fn status_color(severity: Severity, tier: ColorTier) -> MapColor {
    let rgb = base_rgb(severity);
    match tier {
        ColorTier::Station => MapColor { rgb, alpha: None },
        ColorTier::Segment => MapColor { rgb: rgb.map(|x| x + SEGMENT_OFFSET), alpha: None },
        ColorTier::Unit => MapColor {
            rgb: rgb.map(|x| x + UNIT_OFFSET),
            alpha: Some(UNIT_ALPHA),
        },
    }
}
