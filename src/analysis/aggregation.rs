//! Worst-case severity roll-up through the basin hierarchy.
//!
//! Station severities are lifted to segments, and segment severities to
//! units, by the same routine: a parent's severity is the maximum severity
//! among the children whose membership points at it. A parent with no
//! children, or whose children all lack data, gets `NoInformation`.

use std::collections::{BTreeMap, HashMap};

use crate::alert::thresholds::Severity;

/// Severity per entity id.
pub type StatusMap = BTreeMap<String, Severity>;

/// A many-to-one membership relation: child id → parent id.
pub trait Membership {
    fn parent_of(&self, child_id: &str) -> Option<&str>;
}

impl Membership for HashMap<String, String> {
    fn parent_of(&self, child_id: &str) -> Option<&str> {
        self.get(child_id).map(String::as_str)
    }
}

impl Membership for BTreeMap<String, String> {
    fn parent_of(&self, child_id: &str) -> Option<&str> {
        self.get(child_id).map(String::as_str)
    }
}

/// Maximum severity among the children of `parent_id`.
pub fn aggregate<M: Membership + ?Sized>(parent_id: &str, child_statuses: &StatusMap, membership: &M) -> Severity {
    child_statuses
        .iter()
        .filter(|(child, _)| membership.parent_of(child) == Some(parent_id))
        .map(|(_, severity)| *severity)
        .max()
        .unwrap_or(Severity::NoInformation)
}

/// Applies [`aggregate`] to every parent id.
pub fn roll_up<'a, M: Membership + ?Sized>(
    parent_ids: impl IntoIterator<Item = &'a str>,
    child_statuses: &StatusMap,
    membership: &M,
) -> StatusMap {
    parent_ids
        .into_iter()
        .map(|id| (id.to_string(), aggregate(id, child_statuses, membership)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn statuses(pairs: &[(&str, Severity)]) -> StatusMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn members(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(c, p)| (c.to_string(), p.to_string())).collect()
    }

    #[test]
    fn test_worst_station_dominates_segment() {
        let children = statuses(&[("A", Severity::BelowDa), ("B", Severity::BelowDc)]);
        let m = members(&[("A", "S"), ("B", "S")]);
        assert_eq!(aggregate("S", &children, &m), Severity::BelowDc);
    }

    #[test]
    fn test_children_of_other_parents_are_ignored() {
        let children = statuses(&[("A", Severity::AboveDoe), ("B", Severity::BelowDc)]);
        let m = members(&[("A", "S1"), ("B", "S2")]);
        assert_eq!(aggregate("S1", &children, &m), Severity::AboveDoe);
    }

    #[test]
    fn test_parent_without_children_is_no_information() {
        let children = statuses(&[("A", Severity::BelowDar)]);
        let m = members(&[("A", "S1")]);
        assert_eq!(aggregate("S9", &children, &m), Severity::NoInformation);
        assert_eq!(aggregate("S1", &StatusMap::new(), &m), Severity::NoInformation);
    }

    #[test]
    fn test_no_information_children_do_not_mask_data() {
        let children = statuses(&[("A", Severity::NoInformation), ("B", Severity::BelowDoe)]);
        let m = members(&[("A", "S"), ("B", "S")]);
        assert_eq!(aggregate("S", &children, &m), Severity::BelowDoe);
    }

    #[test]
    fn test_unassigned_child_belongs_to_nobody() {
        let children = statuses(&[("A", Severity::BelowDc)]);
        assert_eq!(aggregate("S", &children, &HashMap::new()), Severity::NoInformation);
    }

    #[test]
    fn test_roll_up_covers_every_parent_and_chains_levels() {
        let stations = statuses(&[
            ("A", Severity::BelowDoe),
            ("B", Severity::BelowDar),
            ("C", Severity::AboveDoe),
        ]);
        let station_segment = members(&[("A", "S1"), ("B", "S1"), ("C", "S2")]);
        let segment_unit: BTreeMap<String, String> =
            [("S1", "U1"), ("S2", "U1"), ("S3", "U2")]
                .iter()
                .map(|(c, p)| (c.to_string(), p.to_string()))
                .collect();

        let segments = roll_up(["S1", "S2", "S3"], &stations, &station_segment);
        assert_eq!(segments["S1"], Severity::BelowDar);
        assert_eq!(segments["S2"], Severity::AboveDoe);
        assert_eq!(segments["S3"], Severity::NoInformation);

        let units = roll_up(["U1", "U2"], &segments, &segment_unit);
        assert_eq!(units["U1"], Severity::BelowDar);
        assert_eq!(units["U2"], Severity::NoInformation);
    }

    // --- Properties ---------------------------------------------------------

    fn severity() -> impl Strategy<Value = Severity> {
        (0u8..=5).prop_map(|l| Severity::from_level(l).unwrap_or_default())
    }

    proptest! {
        #[test]
        fn prop_singleton_aggregate_is_identity(s in severity()) {
            let children = statuses(&[("A", s)]);
            let m = members(&[("A", "P")]);
            prop_assert_eq!(aggregate("P", &children, &m), s);
        }

        #[test]
        fn prop_raising_a_child_never_lowers_parent(
            levels in proptest::collection::vec(severity(), 1..10),
            pick in 0usize..10,
            raised in severity(),
        ) {
            let ids: Vec<String> = (0..levels.len()).map(|i| format!("c{}", i)).collect();
            let m: HashMap<String, String> = ids.iter().map(|id| (id.clone(), "P".to_string())).collect();
            let before: StatusMap = ids.iter().cloned().zip(levels.iter().copied()).collect();

            let target = &ids[pick % ids.len()];
            let mut after = before.clone();
            let current = after[target];
            after.insert(target.clone(), current.max(raised));

            prop_assert!(aggregate("P", &after, &m) >= aggregate("P", &before, &m));
        }
    }
}
