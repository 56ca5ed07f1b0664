//! Group contiguous rows sharing a key.
//!
//! ```text
//! rows (sorted by key)           groups
//! ┌──────────────────┐          ┌────────────────────────┐
//! │ key: 1, line: a  │          │ key: 1  [a, b]         │
//! │ key: 1, line: b  │    →     ├────────────────────────┤
//! │ key: 2, line: -  │          │ key: 2  [-]            │
//! └──────────────────┘          └────────────────────────┘
//! ```
//!
//! Keys must be contiguous. Equal keys separated by a different key come out
//! as separate groups; nothing is buffered to merge them.

use std::mem;

/// A non-empty run of consecutive records sharing one key, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, T> {
    key: K,
    records: Vec<T>,
}

impl<K, T> Group<K, T> {
    /// Start a group from its first record.
    pub(crate) fn start(key: K, first: T) -> Self {
        Self {
            key,
            records: vec![first],
        }
    }

    pub(crate) fn push(&mut self, record: T) {
        self.records.push(record);
    }

    /// Key shared by every record of the group.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// First record of the group. Always present.
    pub fn first(&self) -> &T {
        &self.records[0]
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; groups are never empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn into_parts(self) -> (K, Vec<T>) {
        (self.key, self.records)
    }
}

impl<K, T> IntoIterator for Group<K, T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Feed one record into the open group.
///
/// Returns the previous group when `record` starts a new one.
pub(crate) fn advance<K: PartialEq, T>(
    open: &mut Option<Group<K, T>>,
    key: K,
    record: T,
) -> Option<Group<K, T>> {
    match open {
        Some(group) if group.key == key => {
            group.push(record);
            None
        }
        Some(group) => Some(mem::replace(group, Group::start(key, record))),
        None => {
            *open = Some(Group::start(key, record));
            None
        }
    }
}

/// Iterator adapter emitting one [`Group`] per run of equal consecutive keys.
///
/// Created by [`SequenceExt::group_by_key`](super::SequenceExt::group_by_key).
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct GroupBy<I, F, K, T> {
    upstream: I,
    key_fn: F,
    open: Option<Group<K, T>>,
    finished: bool,
}

impl<I, F, K, T> GroupBy<I, F, K, T> {
    pub fn new(upstream: I, key_fn: F) -> Self {
        Self {
            upstream,
            key_fn,
            open: None,
            finished: false,
        }
    }
}

impl<I, F, K, T, E> Iterator for GroupBy<I, F, K, T>
where
    I: Iterator<Item = Result<T, E>>,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    type Item = Result<Group<K, T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.upstream.next() {
                Some(Ok(record)) => {
                    let key = (self.key_fn)(&record);
                    if let Some(done) = advance(&mut self.open, key, record) {
                        return Some(Ok(done));
                    }
                }
                Some(Err(e)) => {
                    // The open group is incomplete; drop it rather than emit it.
                    self.open = None;
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    return self.open.take().map(Ok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceExt;

    fn ok_rows(keys: &[i32]) -> impl Iterator<Item = Result<(i32, usize), String>> + '_ {
        keys.iter().enumerate().map(|(i, k)| Ok((*k, i)))
    }

    fn keys_of(groups: &[Group<i32, (i32, usize)>]) -> Vec<(i32, usize)> {
        groups.iter().map(|g| (*g.key(), g.len())).collect()
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let groups: Vec<_> = ok_rows(&[]).group_by_key(|r| r.0).collect();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_single_record_single_group() {
        let groups: Result<Vec<_>, _> = ok_rows(&[5]).group_by_key(|r| r.0).collect();
        let groups = groups.unwrap();
        assert_eq!(keys_of(&groups), vec![(5, 1)]);
        assert_eq!(groups[0].first(), &(5, 0));
    }

    #[test]
    fn test_groups_match_runs_of_sorted_keys() {
        let cases: Vec<(Vec<i32>, Vec<(i32, usize)>)> = vec![
            (vec![1, 1, 2], vec![(1, 2), (2, 1)]),
            (vec![1, 2, 3], vec![(1, 1), (2, 1), (3, 1)]),
            (vec![4, 4, 4, 4], vec![(4, 4)]),
            (vec![1, 1, 2, 2, 2, 9], vec![(1, 2), (2, 3), (9, 1)]),
        ];

        for (input, expected) in cases {
            let groups: Vec<_> = ok_rows(&input)
                .group_by_key(|r| r.0)
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(keys_of(&groups), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_concatenated_groups_reproduce_input() {
        let input = [3, 3, 1, 1, 1, 7, 3, 3];
        let flattened: Vec<(i32, usize)> = ok_rows(&input)
            .group_by_key(|r| r.0)
            .map(|g| g.unwrap().into_records())
            .flatten()
            .collect();
        let original: Vec<(i32, usize)> = ok_rows(&input).map(|r| r.unwrap()).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_non_contiguous_keys_are_not_merged() {
        let groups: Vec<_> = ok_rows(&[1, 2, 1])
            .group_by_key(|r| r.0)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(keys_of(&groups), vec![(1, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_upstream_error_drops_open_group_and_stops() {
        let mut pulls = 0;
        let rows = vec![Ok((1, 0)), Ok((1, 1)), Err("cursor lost".to_string()), Ok((2, 3))];
        let upstream = rows.into_iter().inspect(|_| pulls += 1);

        let out: Vec<_> = upstream.group_by_key(|r: &(i32, usize)| r.0).collect();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0], Err("cursor lost".to_string()));
        assert_eq!(pulls, 3);
    }

    #[test]
    fn test_error_after_complete_group_emits_that_group_first() {
        let rows = vec![Ok((1, 0)), Ok((2, 1)), Err("boom".to_string())];
        let out: Vec<_> = rows.into_iter().group_by_key(|r| r.0).collect();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap().key(), &1);
        assert!(out[1].is_err());
    }

    #[test]
    fn test_pulls_lazily() {
        let mut pulled = Vec::new();
        let rows = [1, 1, 2, 3].map(|k| Ok::<_, ()>(k));
        let mut groups = rows
            .into_iter()
            .inspect(|r| pulled.push(*r.as_ref().unwrap()))
            .group_by_key(|k| *k);

        let first = groups.next().unwrap().unwrap();
        assert_eq!(first.records(), &[1, 1]);
        drop(groups);
        // Closing group 1 needs exactly one look-ahead row.
        assert_eq!(pulled, vec![1, 1, 2]);
    }
}
