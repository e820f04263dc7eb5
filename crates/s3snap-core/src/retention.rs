//! Which remote archives to keep and which to delete.

use std::cmp::Ordering;

use crate::types::RemoteObject;

/// Number of most recent archives kept in the bucket.
pub const DEFAULT_KEEP: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Newest first.
    pub keep: Vec<RemoteObject>,
    /// Newest first; every entry is no newer than any kept one.
    pub delete: Vec<RemoteObject>,
}

/// Newest first. Equal `last_modified` falls back to the key, greater first.
pub fn newest_first(a: &RemoteObject, b: &RemoteObject) -> Ordering {
    b.last_modified
        .cmp(&a.last_modified)
        .then_with(|| b.key.cmp(&a.key))
}

/// Keep the `keep` newest objects, select the rest for deletion.
pub fn select_for_deletion(objects: &[RemoteObject], keep: usize) -> RetentionPlan {
    let mut sorted = objects.to_vec();
    sorted.sort_by(newest_first);
    let delete = sorted.split_off(keep.min(sorted.len()));
    RetentionPlan {
        keep: sorted,
        delete,
    }
}

/// The object a restore should fetch.
pub fn latest(objects: &[RemoteObject]) -> Option<&RemoteObject> {
    objects.iter().min_by(|a, b| newest_first(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn obj(key: &str, secs: i64) -> RemoteObject {
        RemoteObject::new(key, at(secs), 10)
    }

    fn keys(objs: &[RemoteObject]) -> Vec<&str> {
        objs.iter().map(|o| o.key.as_str()).collect()
    }

    #[test]
    fn keeps_three_newest_by_default() {
        let objects = vec![
            obj("b", 20),
            obj("e", 50),
            obj("a", 10),
            obj("d", 40),
            obj("c", 30),
        ];
        let plan = select_for_deletion(&objects, DEFAULT_KEEP);
        assert_eq!(keys(&plan.keep), ["e", "d", "c"]);
        assert_eq!(keys(&plan.delete), ["b", "a"]);
    }

    #[test]
    fn fewer_objects_than_keep_deletes_nothing() {
        let objects = vec![obj("a", 1), obj("b", 2)];
        let plan = select_for_deletion(&objects, 3);
        assert!(plan.delete.is_empty());
        assert_eq!(plan.keep.len(), 2);
        assert_eq!(select_for_deletion(&[], 3), RetentionPlan::default());
    }

    #[test]
    fn keep_zero_deletes_everything() {
        let objects = vec![obj("a", 1), obj("b", 2)];
        let plan = select_for_deletion(&objects, 0);
        assert!(plan.keep.is_empty());
        assert_eq!(keys(&plan.delete), ["b", "a"]);
    }

    #[test]
    fn deletion_count_and_ordering_hold_for_many_sizes() {
        for n in 0..12usize {
            for k in 0..6usize {
                // Distinct timestamps in scrambled order.
                let objects: Vec<_> = (0..n)
                    .map(|i| obj(&format!("k{i}"), ((i * 5) % 13) as i64))
                    .collect();
                let plan = select_for_deletion(&objects, k);
                assert_eq!(plan.delete.len(), n.saturating_sub(k), "n={n} k={k}");
                assert_eq!(plan.keep.len() + plan.delete.len(), n);
                for d in &plan.delete {
                    for kept in &plan.keep {
                        assert!(d.last_modified <= kept.last_modified);
                    }
                }
            }
        }
    }

    #[test]
    fn ties_break_on_key() {
        let objects = vec![
            obj("app-snapshot-2024-01-01-00-00-01.tar.gz", 5),
            obj("app-snapshot-2024-01-01-00-00-03.tar.gz", 5),
            obj("app-snapshot-2024-01-01-00-00-02.tar.gz", 5),
        ];
        let plan = select_for_deletion(&objects, 1);
        assert_eq!(keys(&plan.keep), ["app-snapshot-2024-01-01-00-00-03.tar.gz"]);
        assert_eq!(
            latest(&objects).unwrap().key,
            "app-snapshot-2024-01-01-00-00-03.tar.gz"
        );
    }

    #[test]
    fn latest_picks_max_last_modified() {
        let objects = vec![obj("old", 1), obj("new", 9), obj("mid", 5)];
        assert_eq!(latest(&objects).unwrap().key, "new");
        assert!(latest(&[]).is_none());
    }
}
