use std::collections::HashSet;

use crate::types::Identified;

/// Result of folding one fetched batch into the accumulated list.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    pub items: Vec<T>,
    /// Items from the batch that were not already present
    pub added: usize,
    /// Size of the batch before dedup
    pub raw_len: usize,
}

impl<T> Merged<T> {
    /// The server returned something, but all of it was already on screen.
    pub fn is_overlap_only(&self) -> bool {
        self.raw_len > 0 && self.added == 0
    }
}

/// Fold `incoming` into `existing`.
///
/// A reset replaces the list wholesale. An append keeps `existing` untouched
/// and adds the incoming items whose identity has not been seen yet, in
/// arrival order.
pub fn merge<T: Identified>(existing: Vec<T>, incoming: Vec<T>, is_reset: bool) -> Merged<T> {
    let raw_len = incoming.len();

    let mut items = if is_reset { Vec::new() } else { existing };
    let mut seen: HashSet<T::Id> = items.iter().map(Identified::id).collect();
    items.reserve(incoming.len());

    let before = items.len();
    for item in incoming {
        // first occurrence wins, also within a single batch
        if seen.insert(item.id()) {
            items.push(item);
        }
    }

    Merged {
        added: items.len() - before,
        items,
        raw_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Identified for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn rows(ids: std::ops::RangeInclusive<u32>) -> Vec<Row> {
        ids.map(|id| Row { id, label: "" }).collect()
    }

    fn ids(items: &[Row]) -> Vec<u32> {
        items.iter().map(|r| r.id).collect()
    }

    #[test]
    fn append_drops_overlapping_ids() {
        let merged = merge(rows(1..=10), rows(8..=17), false);
        assert_eq!(ids(&merged.items), (1..=17).collect::<Vec<_>>());
        assert_eq!(merged.added, 7);
        assert_eq!(merged.raw_len, 10);
    }

    #[test]
    fn reset_replaces_everything() {
        let merged = merge(rows(1..=10), rows(20..=22), true);
        assert_eq!(ids(&merged.items), vec![20, 21, 22]);
        assert_eq!(merged.added, 3);
    }

    #[test]
    fn reset_with_empty_batch_clears() {
        let merged = merge(rows(1..=3), Vec::new(), true);
        assert!(merged.items.is_empty());
        assert!(!merged.is_overlap_only());
    }

    #[test]
    fn fully_overlapping_page_adds_nothing() {
        let merged = merge(rows(1..=10), rows(1..=10), false);
        assert_eq!(merged.items.len(), 10);
        assert!(merged.is_overlap_only());
    }

    #[test]
    fn keeps_first_seen_version() {
        let existing = vec![Row { id: 1, label: "old" }];
        let incoming = vec![Row { id: 1, label: "new" }, Row { id: 2, label: "b" }];
        let merged = merge(existing, incoming, false);
        assert_eq!(merged.items[0].label, "old");
        assert_eq!(merged.added, 1);
    }

    #[test]
    fn duplicates_inside_one_batch_are_dropped() {
        let incoming = vec![
            Row { id: 5, label: "a" },
            Row { id: 6, label: "b" },
            Row { id: 5, label: "c" },
        ];
        let merged = merge(Vec::new(), incoming, true);
        assert_eq!(ids(&merged.items), vec![5, 6]);
        assert_eq!(merged.raw_len, 3);
    }

    #[test]
    fn many_overlapping_pages_keep_each_id_once() {
        let mut items = Vec::new();
        for start in [1u32, 4, 2, 9, 7] {
            items = merge(items, rows(start..=start + 5), false).items;
        }
        let got = ids(&items);
        let unique: HashSet<u32> = got.iter().copied().collect();
        assert_eq!(got.len(), unique.len());
        assert_eq!(got, (1..=14).collect::<Vec<_>>());
    }
}
