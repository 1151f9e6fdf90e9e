use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::db::{DedupKey, NotificationRecord};

/// Records accumulated across page fetches, indexed by content identity.
///
/// At most one record is held per `(title, message, job_id)`: the one with the
/// latest timestamp seen so far.
#[derive(Debug, Default)]
pub(crate) struct WorkingSet {
    entries: HashMap<DedupKey, NotificationRecord>,
}

impl WorkingSet {
    /// Merge fetched records, skipping ids for which `is_excluded` holds.
    /// Returns how many records changed the set.
    pub(crate) fn absorb<F>(&mut self, incoming: Vec<NotificationRecord>, is_excluded: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut changed = 0;
        for record in incoming {
            if is_excluded(&record.id) {
                continue;
            }
            match self.entries.entry(record.dedup_key()) {
                Entry::Occupied(mut slot) => {
                    if record.timestamp > slot.get().timestamp {
                        slot.insert(record);
                        changed += 1;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    changed += 1;
                }
            }
        }
        changed
    }

    pub(crate) fn remove_id(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, record| record.id != id);
        self.entries.len() != before
    }

    pub(crate) fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.entries.values().find(|record| record.id == id)
    }

    /// Newest first; ties on timestamp fall back to id, descending.
    pub(crate) fn ordered(&self) -> Vec<NotificationRecord> {
        let mut out: Vec<NotificationRecord> = self.entries.values().cloned().collect();
        out.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        out
    }
}

#[cfg(test)]
impl WorkingSet {
    fn contains_id(&self, id: &str) -> bool {
        self.entries.values().any(|record| record.id == id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::services::feed::testing::record;

    #[test]
    fn keeps_latest_of_duplicates() {
        let mut set = WorkingSet::default();
        
        set.absorb(
            vec![
                record("a", "Job1", "New job", Some("j1"), 5),
                record("b", "Job1", "New job", Some("j1"), 9),
            ],
            |_| false,
        );

        let ordered = set.ordered();
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, "b");
    }

    #[test]
    fn later_older_duplicate_does_not_replace() {
        let mut set = WorkingSet::default();
        
        set.absorb(vec![record("b", "Job1", "New job", Some("j1"), 9)], |_| false);
        let changed = set.absorb(vec![record("a", "Job1", "New job", Some("j1"), 5)], |_| false);

        assert_eq!(changed, 0);
        assert_eq!(set.ordered()[0].id, "b");
    }

    #[test]
    fn job_id_is_part_of_identity() {
        let mut set = WorkingSet::default();
        set.absorb(
            vec![
                record("a", "Job1", "New job", Some("j1"), 5),
                record("b", "Job1", "New job", Some("j2"), 6),
                record("c", "Job1", "New job", None, 7),
            ],
            |_| false,
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn excluded_ids_are_skipped() {
        let mut set = WorkingSet::default();
        let excluded: HashSet<String> = ["a".to_string()].into_iter().collect();
        set.absorb(
            vec![
                record("a", "one", "m", None, 1),
                record("b", "two", "m", None, 2),
            ],
            |id| excluded.contains(id),
        );
        assert!(!set.contains_id("a"));
        assert!(set.contains_id("b"));
    }

    #[test]
    fn ordered_is_newest_first() {
        let mut set = WorkingSet::default();
        set.absorb(
            vec![
                record("a", "one", "m", None, 3),
                record("b", "two", "m", None, 8),
                record("c", "three", "m", None, 1),
            ],
            |_| false,
        );
        let ids: Vec<String> = set.ordered().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        assert!(set.remove_id("a"));
        assert!(!set.remove_id("a"));
        assert_eq!(set.len(), 2);
    }
}
