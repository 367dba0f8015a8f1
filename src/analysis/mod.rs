/// Status computation over the basin snapshot.
///
/// This module holds the whole classification-to-window pipeline and the
/// reshaping helpers the presentation layer consumes. Rendering (maps,
/// charts, tables) is not done here.
///
/// Submodules:
/// - `series` — long-format flow tables, extraction, pivoting, filters.
/// - `aggregation` — worst-case roll-up through a membership relation.
/// - `daily` — classification + roll-up for one day, day view, distribution.
/// - `window` — rolling W-day status matrices and crossed-threshold table.
/// - `groupings` — named station groups (rivers).
/// - `periods` — look-back periods for instantaneous flows.

pub mod aggregation;
pub mod daily;
pub mod groupings;
pub mod periods;
pub mod series;
pub mod window;
