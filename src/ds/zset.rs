use bytes::Bytes;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound::{Excluded, Included, Unbounded};

/// A set of members ordered by a signed 64-bit integer score.
///
/// The ordered index is keyed by `(score, member)` so equal scores tie-break
/// on the member, and a score-range scan is O(log n + k). A member→score map
/// is kept beside it for O(1) membership and score lookup; `add` keeps the two
/// coherent by evicting a member's old index entry before inserting the new
/// one.
///
/// The key-expiry wheel reuses this container with unix seconds as scores.
#[derive(Debug)]
pub(crate) struct SortedSet {
    key: String,
    scores: HashMap<String, i64>,
    index: BTreeSet<(i64, String)>,
}

impl SortedSet {
    pub(crate) fn new(key: &str) -> SortedSet {
        SortedSet {
            key: key.to_string(),
            scores: HashMap::new(),
            index: BTreeSet::new(),
        }
    }

    /// Insert `member` with `score`, replacing any previous score.
    pub(crate) fn add(&mut self, score: i64, member: &str) {
        if let Some(old) = self.scores.insert(member.to_string(), score) {
            self.index.remove(&(old, member.to_string()));
        }
        self.index.insert((score, member.to_string()));
    }

    /// Remove `member`, reporting 1 when it was present.
    pub(crate) fn rem(&mut self, member: &str) -> i64 {
        match self.scores.remove(member) {
            Some(score) => {
                self.index.remove(&(score, member.to_string()));
                1
            }
            None => 0,
        }
    }

    /// Members whose score lies in the inclusive range `[min, max]`, in score
    /// order (member order within equal scores).
    pub(crate) fn range(&self, min: i64, max: i64) -> Vec<String> {
        if min > max {
            return vec![];
        }

        let lower = Included((min, String::new()));
        let upper = if max == i64::MAX {
            Unbounded
        } else {
            Excluded((max + 1, String::new()))
        };

        self.index
            .range((lower, upper))
            .map(|(_, member)| member.clone())
            .collect()
    }

    pub(crate) fn to_cmd(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(2 + 2 * self.scores.len());
        args.push(Bytes::from_static(b"zadd"));
        args.push(Bytes::copy_from_slice(self.key.as_bytes()));
        for (score, member) in &self.index {
            args.push(Bytes::copy_from_slice(score.to_string().as_bytes()));
            args.push(Bytes::copy_from_slice(member.as_bytes()));
        }
        args
    }
}
