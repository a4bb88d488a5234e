//! Timed channel sets.
//!
//! A [`TimedSet`] maps each channel name to the sequence number at which
//! access to it was first granted. Merging two sets keeps the earliest
//! sequence for every channel, so once access is granted the visible start
//! never moves later.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::channel::{validate_channel_name, ChannelSet};
use crate::error::ValidationError;
use crate::{Sequence, NO_ACCESS};

/// Channel name -> sequence at which access began.
///
/// Backed by an ordered map, so iteration and serialized form are in lexical
/// channel order. Equality compares channel names and sequences.
///
/// Deserializing drops grants at [`NO_ACCESS`], the same as [`TimedSet::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimedSet(BTreeMap<String, Sequence>);

impl TimedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant every channel in `channels` at the same sequence.
    pub fn at_sequence<I, S>(channels: I, seq: Sequence) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for channel in channels {
            set.add(channel, seq);
        }
        set
    }

    /// The sequence at which `channel` became visible, if it is present.
    pub fn contains(&self, channel: &str) -> Option<Sequence> {
        self.0.get(channel).copied()
    }

    /// Returns true if `channel` is a key of this set.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.0.contains_key(channel)
    }

    /// Channel names only, dropping sequences.
    pub fn as_set(&self) -> ChannelSet {
        self.0.keys().cloned().collect()
    }

    /// Merge two sets, keeping the earliest sequence for shared channels.
    ///
    /// Commutative, associative and idempotent, so any fold order over a
    /// collection of sets gives the same result.
    pub fn merge(&self, other: &TimedSet) -> TimedSet {
        let mut merged = self.clone();
        merged.merge_in(other);
        merged
    }

    /// Merge `other` into `self` in place. Returns true if anything changed.
    pub fn merge_in(&mut self, other: &TimedSet) -> bool {
        let mut changed = false;
        for (channel, &seq) in &other.0 {
            changed |= self.add(channel.as_str(), seq);
        }
        changed
    }

    /// Merge a single grant. Returns true if the set changed.
    ///
    /// A grant at [`NO_ACCESS`] is ignored. An existing channel only moves
    /// to an earlier sequence, never a later one.
    pub fn add(&mut self, channel: impl Into<String>, seq: Sequence) -> bool {
        if seq == NO_ACCESS {
            return false;
        }
        match self.0.entry(channel.into()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(seq);
                true
            }
            btree_map::Entry::Occupied(mut entry) => {
                if seq < *entry.get() {
                    entry.insert(seq);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop a grant, returning the sequence it had.
    pub fn remove(&mut self, channel: &str) -> Option<Sequence> {
        self.0.remove(channel)
    }

    /// The sub-set of grants whose channel appears in `channels`.
    pub fn restrict_to(&self, channels: &ChannelSet) -> TimedSet {
        // Iterate the smaller side.
        if channels.len() < self.0.len() {
            channels
                .iter()
                .filter_map(|c| self.0.get(c).map(|&seq| (c.clone(), seq)))
                .collect()
        } else {
            self.0
                .iter()
                .filter(|(c, _)| channels.contains(*c))
                .map(|(c, &seq)| (c.clone(), seq))
                .collect()
        }
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no channel is granted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(channel, sequence)` pairs in lexical channel order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Sequence)> + '_ {
        self.0.iter().map(|(c, &seq)| (c.as_str(), seq))
    }

    /// Iterate channel names in lexical order.
    pub fn channels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Check every grant: valid channel name and a real sequence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (channel, &seq) in &self.0 {
            validate_channel_name(channel)?;
            if seq == NO_ACCESS {
                return Err(ValidationError::ZeroSequence(channel.clone()));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, Sequence)> for TimedSet {
    /// Collect grants, merging duplicates with the earliest-wins rule.
    fn from_iter<I: IntoIterator<Item = (S, Sequence)>>(iter: I) -> Self {
        let mut set = TimedSet::new();
        for (channel, seq) in iter {
            set.add(channel, seq);
        }
        set
    }
}

impl<'de> Deserialize<'de> for TimedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let grants = BTreeMap::<String, Sequence>::deserialize(deserializer)?;
        Ok(grants.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TimedSet {
    type Item = (&'a String, &'a Sequence);
    type IntoIter = btree_map::Iter<'a, String, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(pairs: &[(&str, u64)]) -> TimedSet {
        pairs.iter().map(|&(c, s)| (c, s)).collect()
    }

    fn names(list: &[&str]) -> ChannelSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_earliest_wins() {
        let a = ts(&[("c", 5)]);
        let b = ts(&[("c", 9)]);

        assert_eq!(a.merge(&b).contains("c"), Some(5));
        assert_eq!(b.merge(&a).contains("c"), Some(5));
    }

    #[test]
    fn test_merge_unions_channels() {
        let a = ts(&[("a", 3)]);
        let b = ts(&[("b", 7), ("a", 1)]);

        assert_eq!(a.merge(&b), ts(&[("a", 1), ("b", 7)]));
    }

    #[test]
    fn test_merge_with_empty() {
        let a = ts(&[("a", 3), ("b", 4)]);
        assert_eq!(a.merge(&TimedSet::new()), a);
        assert_eq!(TimedSet::new().merge(&a), a);
    }

    #[test]
    fn test_merge_in_reports_change() {
        let mut a = ts(&[("a", 3)]);

        assert!(!a.merge_in(&ts(&[("a", 8)])));
        assert!(a.merge_in(&ts(&[("a", 2)])));
        assert!(a.merge_in(&ts(&[("b", 10)])));
        assert!(!a.merge_in(&a.clone()));
        assert_eq!(a, ts(&[("a", 2), ("b", 10)]));
    }

    #[test]
    fn test_add_ignores_zero_and_later() {
        let mut set = TimedSet::new();
        assert!(!set.add("a", 0));
        assert!(set.is_empty());

        assert!(set.add("a", 4));
        assert!(!set.add("a", 6));
        assert_eq!(set.contains("a"), Some(4));
    }

    #[test]
    fn test_contains_and_as_set() {
        let set = ts(&[("b", 2), ("a", 1)]);

        assert_eq!(set.contains("a"), Some(1));
        assert_eq!(set.contains("z"), None);
        assert!(set.has_channel("b"));
        assert_eq!(set.as_set(), names(&["a", "b"]));
    }

    #[test]
    fn test_at_sequence() {
        let set = TimedSet::at_sequence(["x", "y", "x"], 12);
        assert_eq!(set, ts(&[("x", 12), ("y", 12)]));
    }

    #[test]
    fn test_restrict_to() {
        let set = ts(&[("a", 1), ("b", 7), ("c", 3)]);

        assert_eq!(set.restrict_to(&names(&["a", "z"])), ts(&[("a", 1)]));
        assert_eq!(
            set.restrict_to(&names(&["a", "b", "c", "d", "e"])),
            set
        );
        assert!(set.restrict_to(&ChannelSet::new()).is_empty());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = ts(&[("a", 1), ("b", 2)]);
        let b = ts(&[("b", 2), ("a", 1)]);
        assert_eq!(a, b);
        assert_ne!(a, ts(&[("a", 1), ("b", 3)]));
    }

    #[test]
    fn test_validate() {
        assert!(ts(&[("a", 1)]).validate().is_ok());
        assert!(TimedSet::new().validate().is_ok());

        let mut wildcard = TimedSet::new();
        wildcard.add("*", 1);
        assert_eq!(wildcard.validate(), Err(ValidationError::WildcardChannel));

        let mut empty = TimedSet::new();
        empty.add("", 1);
        assert_eq!(empty.validate(), Err(ValidationError::EmptyChannel));
    }

    #[test]
    fn test_zero_sequence_from_json_is_no_access() {
        let set: TimedSet = serde_json::from_str(r#"{"a":0,"b":4}"#).unwrap();

        assert!(!set.has_channel("a"));
        assert_eq!(set.contains("a"), None);
        assert_eq!(set, ts(&[("b", 4)]));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_json_is_sorted_object() {
        let set = ts(&[("zeta", 2), ("alpha", 9)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"alpha":9,"zeta":2}"#);

        let recovered: TimedSet = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, set);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn timed_set() -> impl Strategy<Value = TimedSet> {
            prop::collection::btree_map("[a-z]{1,6}", 1u64..=1000, 0..8)
                .prop_map(TimedSet::from_iter)
        }

        proptest! {
            #[test]
            fn test_merge_commutative(a in timed_set(), b in timed_set()) {
                prop_assert_eq!(a.merge(&b), b.merge(&a));
            }

            #[test]
            fn test_merge_associative(a in timed_set(), b in timed_set(), c in timed_set()) {
                prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
            }

            #[test]
            fn test_merge_idempotent(a in timed_set()) {
                prop_assert_eq!(a.merge(&a), a.clone());
                prop_assert_eq!(a.merge(&TimedSet::new()), a);
            }

            #[test]
            fn test_merge_keeps_earliest(a in timed_set(), b in timed_set()) {
                let merged = a.merge(&b);

                prop_assert_eq!(merged.as_set(), &a.as_set() | &b.as_set());
                for (channel, seq) in merged.iter() {
                    let earliest = [a.contains(channel), b.contains(channel)]
                        .into_iter()
                        .flatten()
                        .min();
                    prop_assert_eq!(Some(seq), earliest);
                }
            }

            #[test]
            fn test_decoded_sets_never_hold_zero(
                grants in prop::collection::btree_map("[a-z]{1,6}", 0u64..=3, 0..8),
            ) {
                let json = serde_json::to_string(&grants).unwrap();
                let set: TimedSet = serde_json::from_str(&json).unwrap();

                for (channel, seq) in &grants {
                    prop_assert_eq!(set.has_channel(channel), *seq != NO_ACCESS);
                }
                prop_assert!(set.iter().all(|(_, seq)| seq != NO_ACCESS));
            }
        }
    }
}
