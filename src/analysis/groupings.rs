//! Station groupings for group-oriented views (one column per river).
//!
//! Pure filter + tag: no aggregation happens here. A station listed in a
//! group but absent from the day view is skipped.

use crate::analysis::daily::{DailyStatus, StationDay};
use crate::config::StationGroup;

/// A station's day row tagged with the group it was selected for.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedStation {
    pub group_name: String,
    /// Position within the group, counted after filtering.
    pub position: usize,
    pub station: StationDay,
}

/// Stations of `day` whose code is in `station_ids`, in day-view order,
/// tagged with `group_name`.
pub fn group_by_group<S: AsRef<str>>(group_name: &str, station_ids: &[S], day: &DailyStatus) -> Vec<GroupedStation> {
    day.stations
        .iter()
        .filter(|s| station_ids.iter().any(|id| id.as_ref() == s.code))
        .enumerate()
        .map(|(position, s)| GroupedStation {
            group_name: group_name.to_string(),
            position,
            station: s.clone(),
        })
        .collect()
}

/// [`group_by_group`] over every group, concatenated in group order.
pub fn group_all(groups: &[StationGroup], day: &DailyStatus) -> Vec<GroupedStation> {
    groups
        .iter()
        .flat_map(|g| group_by_group(&g.name, &g.stations, day))
        .collect()
}
