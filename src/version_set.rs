// SPDX-License-Identifier: MPL-2.0

//! The resolver never enumerates versions. Everything it learns about a
//! package is a set of versions, and everything it does with that knowledge
//! goes through the set operations below: intersecting constraints,
//! complementing terms, and comparing the results.

use std::fmt::{Debug, Display};

use crate::Ranges;

/// A set of versions, the payload of every [`Term`](crate::Term).
///
/// [`Ranges`] implements this trait and is what the resolver is normally
/// instantiated with, but any type with proper set semantics over a totally
/// ordered version type can take its place.
///
/// # Structural equality is set equality
///
/// The resolver reads `a == b` as "a and b contain the same versions", and
/// several hot checks (`subset_of`, `is_disjoint`) reduce to such
/// comparisons. An implementation must therefore keep every value in a
/// canonical form: `#[derive(Eq, PartialEq)]` is only sound when each
/// operation returns the one normal form of its result. [`Ranges`] earns this
/// by storing sorted, pairwise disjoint segments and merging any two segments
/// that touch on an inclusive bound, so `>=1, <4 | >=2, <5` and `>=1, <5`
/// are the same value bit for bit. An implementation that can return either
/// spelling depending on how the value was computed will make unit
/// propagation misjudge relations between terms.
///
/// # Every version is possible
///
/// Which versions of a package were actually published is the
/// [provider](crate::DependencyProvider)'s business, not the set's. The
/// operations must uphold the set laws over the entire version domain; in
/// particular `complement` is relative to all conceivable versions, not to
/// the available ones.
pub trait VersionSet: Debug + Display + Clone + Eq {
    /// Version type associated with the sets manipulated.
    type V: Debug + Display + Clone + Ord;

    // Constructors

    /// The set containing no version.
    fn empty() -> Self;

    /// The set containing exactly `v`.
    fn singleton(v: Self::V) -> Self;

    // Operations

    /// The set of all versions not in this set.
    fn complement(&self) -> Self;

    /// The set of versions in both `self` and `other`.
    fn intersection(&self, other: &Self) -> Self;

    /// Whether `v` is in this set.
    fn contains(&self, v: &Self::V) -> bool;

    // Derived operations
    //
    // The default bodies are definitionally correct; implementations may
    // override them with something faster, as long as the output stays equal
    // to the default one.

    /// The set containing every version: the complement of the empty set.
    fn full() -> Self {
        Self::empty().complement()
    }

    /// The set of versions in either (or both) of the sets, by De Morgan:
    /// the complement of the intersection of the complements.
    fn union(&self, other: &Self) -> Self {
        self.complement()
            .intersection(&other.complement())
            .complement()
    }

    /// Whether the two sets share no version.
    fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other) == Self::empty()
    }

    /// Whether every version of `self` is also in `other`.
    fn subset_of(&self, other: &Self) -> bool {
        self == &self.intersection(other)
    }
}

/// [`Ranges`] overrides every derived operation with the direct linear-merge
/// implementations of its own crate, which also keep the canonical form.
impl<T: Debug + Display + Clone + Eq + Ord> VersionSet for Ranges<T> {
    type V = T;

    fn empty() -> Self {
        Ranges::empty()
    }

    fn singleton(v: Self::V) -> Self {
        Ranges::singleton(v)
    }

    fn complement(&self) -> Self {
        Ranges::complement(self)
    }

    fn intersection(&self, other: &Self) -> Self {
        Ranges::intersection(self, other)
    }

    fn contains(&self, v: &Self::V) -> bool {
        Ranges::contains(self, v)
    }

    fn full() -> Self {
        Ranges::full()
    }

    fn union(&self, other: &Self) -> Self {
        Ranges::union(self, other)
    }

    fn is_disjoint(&self, other: &Self) -> bool {
        Ranges::is_disjoint(self, other)
    }

    fn subset_of(&self, other: &Self) -> bool {
        Ranges::subset_of(self, other)
    }
}
