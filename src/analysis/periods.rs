//! Look-back periods for instantaneous (Qi) flow views.
//!
//! A period ending on day E covers `[E - n days, E)`, with both bounds taken
//! at UTC midnight and expressed in the reference timezone.

use chrono::Days;
use chrono_tz::Tz;

use crate::analysis::series::FlowTable;
use crate::model::{Day, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QiPeriod {
    Week,
    Fortnight,
    Month,
    TwoMonths,
    ThreeMonths,
}

impl QiPeriod {
    pub const ALL: [QiPeriod; 5] = [
        QiPeriod::Week,
        QiPeriod::Fortnight,
        QiPeriod::Month,
        QiPeriod::TwoMonths,
        QiPeriod::ThreeMonths,
    ];

    pub fn days(self) -> u64 {
        match self {
            QiPeriod::Week => 7,
            QiPeriod::Fortnight => 15,
            QiPeriod::Month => 30,
            QiPeriod::TwoMonths => 60,
            QiPeriod::ThreeMonths => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QiPeriod::Week => "7 jours",
            QiPeriod::Fortnight => "15 jours",
            QiPeriod::Month => "1 mois",
            QiPeriod::TwoMonths => "2 mois",
            QiPeriod::ThreeMonths => "3 mois",
        }
    }

    pub fn from_label(label: &str) -> Option<QiPeriod> {
        QiPeriod::ALL.into_iter().find(|p| p.label() == label.trim())
    }

    /// Half-open `[start, end)` bounds of this period ending on `end_day`.
    /// `None` if the start would fall before the calendar's range.
    pub fn bounds(self, end_day: Day, tz: Tz) -> Option<(Instant, Instant)> {
        let start_day = end_day.checked_sub_days(Days::new(self.days()))?;
        let start = start_day.and_hms_opt(0, 0, 0)?.and_utc().with_timezone(&tz);
        let end = end_day.and_hms_opt(0, 0, 0)?.and_utc().with_timezone(&tz);
        Some((start, end))
    }
}

impl FlowTable<Instant> {
    /// Readings inside `period` ending on `end_day`.
    pub fn in_period(&self, end_day: Day, period: QiPeriod, tz: Tz) -> FlowTable<Instant> {
        match period.bounds(end_day, tz) {
            Some((start, end)) => self.filter_time(start..end),
            None => FlowTable::from_readings(Vec::new()),
        }
    }
}
