// SPDX-License-Identifier: MPL-2.0

//! Sets of versions over any totally ordered version type.
//!
//! [`Ranges`] represents a set of versions as an ordered sequence of disjoint
//! intervals, each delimited by an inclusive, exclusive or unbounded endpoint.
//! All set operations (complement, union, intersection, subset, ...) are
//! implemented directly on that representation, in time linear in the number
//! of segments, and always return the canonical form:
//!
//! - segments are sorted and pairwise disjoint;
//! - two segments touching at a shared value are merged whenever at least one
//!   of the two bounds at that value is inclusive (there is no version between
//!   them), and kept apart only when both are exclusive (the shared value
//!   itself separates them);
//! - a segment is valid iff its start is strictly below its end, or both are
//!   the same inclusive value (a singleton).
//!
//! Canonical form is what makes structural equality coincide with set
//! equality, which the solver relies on.

use std::fmt::{Display, Formatter};
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::ops::RangeBounds;

#[cfg(any(feature = "proptest", test))]
pub mod testing;

/// Inline storage for the overwhelmingly common 1–2 segment case.
pub(crate) type SmallVec<T> = smallvec::SmallVec<[T; 2]>;

/// A segment of contiguous versions.
type Interval<V> = (Bound<V>, Bound<V>);

/// A set of versions, stored as sorted disjoint intervals.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ranges<V> {
    pub(crate) segments: SmallVec<Interval<V>>,
}

impl<V> Ranges<V> {
    /// The empty set, containing no version.
    pub fn empty() -> Self {
        Self {
            segments: SmallVec::new(),
        }
    }

    /// The set containing every version.
    pub fn full() -> Self {
        Self {
            segments: smallvec::smallvec![(Unbounded, Unbounded)],
        }
    }

    /// The set of versions greater than or equal to `v`.
    pub fn higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec::smallvec![(Included(v.into()), Unbounded)],
        }
    }

    /// The set of versions strictly greater than `v`.
    pub fn strictly_higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec::smallvec![(Excluded(v.into()), Unbounded)],
        }
    }

    /// The set of versions less than or equal to `v`.
    pub fn lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec::smallvec![(Unbounded, Included(v.into()))],
        }
    }

    /// The set of versions strictly less than `v`.
    pub fn strictly_lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec::smallvec![(Unbounded, Excluded(v.into()))],
        }
    }

    /// Whether this set contains no version at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<V: Clone> Ranges<V> {
    /// The set containing exactly one version.
    pub fn singleton(v: impl Into<V>) -> Self {
        let v = v.into();
        Self {
            segments: smallvec::smallvec![(Included(v.clone()), Included(v))],
        }
    }

    /// If this set is a single inclusive point, return that version.
    pub fn as_singleton(&self) -> Option<&V>
    where
        V: Eq,
    {
        match self.segments.as_slice() {
            [(Included(v1), Included(v2))] if v1 == v2 => Some(v1),
            _ => None,
        }
    }
}

impl<V: Ord> Ranges<V> {
    /// The set of versions `lo <= v < hi`.
    pub fn between(lo: impl Into<V>, hi: impl Into<V>) -> Self {
        let (lo, hi) = (lo.into(), hi.into());
        if lo < hi {
            Self {
                segments: smallvec::smallvec![(Included(lo), Excluded(hi))],
            }
        } else {
            Self::empty()
        }
    }

    /// Whether the set contains the given version.
    pub fn contains(&self, version: &V) -> bool {
        self.segments
            .iter()
            .any(|segment| segment_contains(segment, version))
    }
}

impl<V: Ord + Clone> Ranges<V> {
    /// Build a set from any of the `std::ops` range syntaxes.
    pub fn from_range_bounds<R, IV>(bounds: R) -> Self
    where
        R: RangeBounds<IV>,
        IV: Clone + Into<V>,
    {
        let start = match bounds.start_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        let end = match bounds.end_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        if valid_segment(&start, &end) {
            Self {
                segments: smallvec::smallvec![(start, end)],
            }
        } else {
            Self::empty()
        }
    }

    /// The set of all versions not in this set.
    pub fn complement(&self) -> Self {
        match self.segments.first() {
            None => Self::full(),
            Some((Unbounded, Unbounded)) => Self::empty(),
            Some((Unbounded, Included(v))) => {
                Self::negate_segments(Excluded(v.clone()), &self.segments[1..])
            }
            Some((Unbounded, Excluded(v))) => {
                Self::negate_segments(Included(v.clone()), &self.segments[1..])
            }
            Some((Included(_), _)) | Some((Excluded(_), _)) => {
                Self::negate_segments(Unbounded, &self.segments)
            }
        }
    }

    /// Negate segments, assuming `start` is the lower bound of the first
    /// complement segment.
    fn negate_segments(start: Bound<V>, segments: &[Interval<V>]) -> Self {
        let mut complement_segments: SmallVec<Interval<V>> = SmallVec::new();
        let mut start = start;
        for (v1, v2) in segments {
            complement_segments.push((
                start,
                match v1 {
                    Unbounded => unreachable!("lower bound of a non-first segment"),
                    Included(v) => Excluded(v.clone()),
                    Excluded(v) => Included(v.clone()),
                },
            ));
            start = match v2 {
                Unbounded => Unbounded,
                Included(v) => Excluded(v.clone()),
                Excluded(v) => Included(v.clone()),
            };
        }
        if !matches!(start, Unbounded) {
            complement_segments.push((start, Unbounded));
        }
        Self {
            segments: complement_segments,
        }
        .check_invariants()
    }

    /// The set of versions in either (or both) of the two sets.
    ///
    /// A single linear merge over both segment sequences.
    pub fn union(&self, other: &Self) -> Self {
        let mut output: SmallVec<Interval<V>> = SmallVec::new();
        let mut accumulator: Option<Interval<V>> = None;
        let mut left = self.segments.iter().peekable();
        let mut right = other.segments.iter().peekable();
        loop {
            // Pull the interval starting first from either input.
            let next = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => {
                    if left_start_is_smaller(&l.0, &r.0) {
                        left.next()
                    } else {
                        right.next()
                    }
                }
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            }
            .cloned()
            .expect("peeked interval");
            match &mut accumulator {
                None => accumulator = Some(next),
                Some(accumulated) => {
                    if end_before_start_with_gap(&accumulated.1, &next.0) {
                        output.push(std::mem::replace(accumulated, next));
                    } else if left_end_is_smaller(&accumulated.1, &next.1) {
                        accumulated.1 = next.1;
                    }
                }
            }
        }
        if let Some(accumulated) = accumulator {
            output.push(accumulated);
        }
        Self { segments: output }.check_invariants()
    }

    /// The set of versions in both sets.
    ///
    /// A single linear merge over both segment sequences.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut output: SmallVec<Interval<V>> = SmallVec::new();
        let mut left = self.segments.iter().peekable();
        let mut right = other.segments.iter().peekable();
        while let (Some((l_start, l_end)), Some((r_start, r_end))) = (left.peek(), right.peek()) {
            let start = if left_start_is_smaller(l_start, r_start) {
                r_start
            } else {
                l_start
            };
            let end = if left_end_is_smaller(l_end, r_end) {
                l_end
            } else {
                r_end
            };
            if valid_segment(start, end) {
                output.push((start.clone(), end.clone()));
            }
            // Drop the interval that ends first, its remainder is covered.
            if left_end_is_smaller(l_end, r_end) {
                left.next();
            } else {
                right.next();
            }
        }
        Self { segments: output }.check_invariants()
    }

    /// Whether the two sets share no version.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other) == Self::empty()
    }

    /// Whether every version of this set is also in `other`.
    pub fn subset_of(&self, other: &Self) -> bool {
        self == &self.intersection(other)
    }

    /// Check the canonical-form invariants, in debug builds only.
    pub(crate) fn check_invariants(self) -> Self {
        if cfg!(debug_assertions) {
            for p in self.segments.windows(2) {
                assert!(
                    end_before_start_with_gap(&p[0].1, &p[1].0),
                    "segments not disjoint or not separated by a gap",
                );
            }
            for (start, end) in self.segments.iter() {
                assert!(valid_segment(start, end), "invalid segment");
            }
        }
        self
    }
}

fn segment_contains<V: Ord>((start, end): &Interval<V>, version: &V) -> bool {
    (match start {
        Unbounded => true,
        Included(s) => version >= s,
        Excluded(s) => version > s,
    }) && (match end {
        Unbounded => true,
        Included(e) => version <= e,
        Excluded(e) => version < e,
    })
}

/// A segment is valid if it contains at least one version.
fn valid_segment<V: Ord>(start: &Bound<V>, end: &Bound<V>) -> bool {
    match (start, end) {
        (Unbounded, _) | (_, Unbounded) => true,
        (Included(s), Included(e)) => s <= e,
        (Included(s), Excluded(e)) | (Excluded(s), Included(e)) | (Excluded(s), Excluded(e)) => {
            s < e
        }
    }
}

/// True if a segment ending with `end` and a segment starting with `start`
/// cannot be concatenated:
///
/// ```text
/// true:
///   |-----|
///             |-----|
///         ^ end ^ start
/// false (touching, mergeable):
///   |-----|
///         |-----|
/// ```
///
/// When both bounds sit on the same value, the segments stay apart only if
/// both exclude it, since that value itself then lies between them.
fn end_before_start_with_gap<V: Ord>(end: &Bound<V>, start: &Bound<V>) -> bool {
    match (end, start) {
        (Unbounded, _) | (_, Unbounded) => false,
        (Included(e), Included(s)) | (Included(e), Excluded(s)) | (Excluded(e), Included(s)) => {
            e < s
        }
        (Excluded(e), Excluded(s)) => e <= s,
    }
}

/// Compare two lower bounds: does `left` start at or before `right`?
fn left_start_is_smaller<V: Ord>(left: &Bound<V>, right: &Bound<V>) -> bool {
    match (left, right) {
        (Unbounded, _) => true,
        (_, Unbounded) => false,
        (Included(l), Included(r)) | (Excluded(l), Excluded(r)) | (Included(l), Excluded(r)) => {
            l <= r
        }
        (Excluded(l), Included(r)) => l < r,
    }
}

/// Compare two upper bounds: does `left` end at or before `right`?
fn left_end_is_smaller<V: Ord>(left: &Bound<V>, right: &Bound<V>) -> bool {
    match (left, right) {
        (_, Unbounded) => true,
        (Unbounded, _) => false,
        (Included(l), Included(r)) | (Excluded(l), Excluded(r)) | (Excluded(l), Included(r)) => {
            l <= r
        }
        (Included(l), Excluded(r)) => l < r,
    }
}

impl<V: Display + Eq> Display for Ranges<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            write!(f, "∅")?;
        } else {
            for (idx, segment) in self.segments.iter().enumerate() {
                if idx > 0 {
                    write!(f, " | ")?;
                }
                match segment {
                    (Unbounded, Unbounded) => write!(f, "*")?,
                    (Unbounded, Included(v)) => write!(f, "<={v}")?,
                    (Unbounded, Excluded(v)) => write!(f, "<{v}")?,
                    (Included(v), Unbounded) => write!(f, ">={v}")?,
                    (Excluded(v), Unbounded) => write!(f, ">{v}")?,
                    (Included(v), Included(b)) if v == b => write!(f, "=={v}")?,
                    (Included(v), Included(b)) => write!(f, ">={v}, <={b}")?,
                    (Included(v), Excluded(b)) => write!(f, ">={v}, <{b}")?,
                    (Excluded(v), Included(b)) => write!(f, ">{v}, <={b}")?,
                    (Excluded(v), Excluded(b)) => write!(f, ">{v}, <{b}")?,
                }
            }
        }
        Ok(())
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::proptest_strategy;

    #[test]
    fn abutting_closed_segments_merge() {
        // [1, 3) ∪ [3, 5) touches at an included 3: one segment.
        let left = Ranges::<u32>::between(1u32, 3u32);
        let right = Ranges::<u32>::between(3u32, 5u32);
        assert_eq!(left.union(&right), Ranges::between(1u32, 5u32));
    }

    #[test]
    fn abutting_open_segments_keep_their_gap() {
        // (1, 3) ∪ (3, 5): version 3 separates them.
        let left = Ranges::<u32>::strictly_higher_than(1u32)
            .intersection(&Ranges::strictly_lower_than(3u32));
        let right = Ranges::<u32>::strictly_higher_than(3u32)
            .intersection(&Ranges::strictly_lower_than(5u32));
        let union = left.union(&right);
        assert!(!union.contains(&3));
        assert!(union.contains(&2));
        assert!(union.contains(&4));
        assert_eq!(union.segments.len(), 2);
    }

    #[test]
    fn singleton_bridges_open_segments() {
        // (1, 3) ∪ {3} ∪ (3, 5) collapses back to (1, 5).
        let left = Ranges::<u32>::strictly_higher_than(1u32)
            .intersection(&Ranges::strictly_lower_than(3u32));
        let right = Ranges::<u32>::strictly_higher_than(3u32)
            .intersection(&Ranges::strictly_lower_than(5u32));
        let bridged = left.union(&Ranges::singleton(3u32)).union(&right);
        let expected = Ranges::<u32>::strictly_higher_than(1u32)
            .intersection(&Ranges::strictly_lower_than(5u32));
        assert_eq!(bridged, expected);
    }

    #[test]
    fn as_singleton_only_on_closed_points() {
        assert_eq!(Ranges::<u32>::singleton(7u32).as_singleton(), Some(&7));
        assert_eq!(Ranges::<u32>::between(7u32, 8u32).as_singleton(), None);
        assert_eq!(Ranges::<u32>::empty().as_singleton(), None);
        assert_eq!(Ranges::<u32>::full().as_singleton(), None);
    }

    #[test]
    fn between_is_half_open() {
        let r = Ranges::<u32>::between(2u32, 5u32);
        assert!(!r.contains(&1));
        assert!(r.contains(&2));
        assert!(r.contains(&4));
        assert!(!r.contains(&5));
        assert!(Ranges::<u32>::between(5u32, 5u32).is_empty());
    }

    #[test]
    fn from_range_bounds_matches_constructors() {
        assert_eq!(
            Ranges::<u32>::from_range_bounds(2u32..5u32),
            Ranges::between(2u32, 5u32)
        );
        assert_eq!(
            Ranges::<u32>::from_range_bounds(..=5u32),
            Ranges::lower_than(5u32)
        );
        assert_eq!(
            Ranges::<u32>::from_range_bounds(..5u32),
            Ranges::strictly_lower_than(5u32)
        );
        assert_eq!(
            Ranges::<u32>::from_range_bounds(2u32..),
            Ranges::higher_than(2u32)
        );
        assert!(Ranges::<u32>::from_range_bounds(5u32..2u32).is_empty());
    }

    proptest! {
        #[test]
        fn union_is_commutative(a in proptest_strategy(), b in proptest_strategy()) {
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn intersection_is_commutative(a in proptest_strategy(), b in proptest_strategy()) {
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        }

        #[test]
        fn union_is_associative(
            a in proptest_strategy(),
            b in proptest_strategy(),
            c in proptest_strategy(),
        ) {
            prop_assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        }

        #[test]
        fn intersection_is_associative(
            a in proptest_strategy(),
            b in proptest_strategy(),
            c in proptest_strategy(),
        ) {
            prop_assert_eq!(
                a.intersection(&b).intersection(&c),
                a.intersection(&b.intersection(&c))
            );
        }

        #[test]
        fn complement_partitions_the_domain(a in proptest_strategy()) {
            prop_assert_eq!(a.intersection(&a.complement()), Ranges::empty());
            prop_assert_eq!(a.union(&a.complement()), Ranges::full());
        }

        #[test]
        fn double_complement_is_identity(a in proptest_strategy()) {
            prop_assert_eq!(a.complement().complement(), a);
        }

        #[test]
        fn subset_iff_intersection_is_self(a in proptest_strategy(), b in proptest_strategy()) {
            prop_assert_eq!(a.subset_of(&b), a.intersection(&b) == a);
        }

        #[test]
        fn union_contains_both(a in proptest_strategy(), b in proptest_strategy(), v in any::<u32>()) {
            prop_assert_eq!(a.union(&b).contains(&v), a.contains(&v) || b.contains(&v));
        }

        #[test]
        fn intersection_contains_both(a in proptest_strategy(), b in proptest_strategy(), v in any::<u32>()) {
            prop_assert_eq!(a.intersection(&b).contains(&v), a.contains(&v) && b.contains(&v));
        }

        #[test]
        fn complement_flips_membership(a in proptest_strategy(), v in any::<u32>()) {
            prop_assert_eq!(a.complement().contains(&v), !a.contains(&v));
        }

        #[test]
        fn singleton_contains_only_itself(v in any::<u32>(), u in any::<u32>()) {
            prop_assert_eq!(Ranges::<u32>::singleton(v).contains(&u), u == v);
        }

        #[test]
        fn between_membership(lo in any::<u32>(), hi in any::<u32>(), v in any::<u32>()) {
            prop_assert_eq!(Ranges::<u32>::between(lo, hi).contains(&v), lo <= v && v < hi);
        }

        #[test]
        fn is_disjoint_iff_empty_intersection(a in proptest_strategy(), b in proptest_strategy()) {
            prop_assert_eq!(a.is_disjoint(&b), a.intersection(&b).is_empty());
        }
    }
}
