// SPDX-License-Identifier: MPL-2.0

//! A term is the fundamental unit of operation of the solver.
//! It is a positive or negative expression regarding a set of versions.

use std::fmt::{self, Display};

use crate::VersionSet;

/// A positive or negative expression regarding a set of versions.
///
/// `Positive(r)` and `Negative(r.complement())` are not equivalent: a positive
/// term is satisfied only once a version inside `r` has actually been selected
/// for the package, while a negative term is also satisfied by the package
/// being absent from the solution. In particular [`Term::any`], the term
/// satisfied by every assignment, is `Negative(∅)` ("not in the empty set"),
/// and `contains` on a negative term answers "is this concrete version
/// definitely allowed", i.e. membership in the complement.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Term<VS: VersionSet> {
    /// For example, `1.0.0 <= v < 2.0.0` is a positive expression
    /// that is evaluated true if a version is selected
    /// and comprised between version 1.0.0 and version 2.0.0.
    Positive(VS),
    /// The term `not (v < 3.0.0)` is a negative expression
    /// that is evaluated true if a version >= 3.0.0 is selected
    /// or if no version is selected at all.
    Negative(VS),
}

/// Base methods.
impl<VS: VersionSet> Term<VS> {
    /// The vacuous term, satisfied by any assignment.
    /// It is the identity of [intersection](Self::intersection).
    pub(crate) fn any() -> Self {
        Self::Negative(VS::empty())
    }

    /// The absurd term, satisfied by no assignment.
    pub(crate) fn empty() -> Self {
        Self::Positive(VS::empty())
    }

    /// A term constraining a package to exactly the given version.
    pub(crate) fn exact(version: VS::V) -> Self {
        Self::Positive(VS::singleton(version))
    }

    /// Simply check if a term is positive.
    pub(crate) fn is_positive(&self) -> bool {
        match self {
            Self::Positive(_) => true,
            Self::Negative(_) => false,
        }
    }

    /// Negate a term.
    /// Positive becomes negative and vice versa, the set is unchanged.
    pub(crate) fn negate(&self) -> Self {
        match self {
            Self::Positive(set) => Self::Negative(set.clone()),
            Self::Negative(set) => Self::Positive(set.clone()),
        }
    }

    /// Evaluate a term regarding a given choice of version.
    pub(crate) fn contains(&self, v: &VS::V) -> bool {
        match self {
            Self::Positive(set) => set.contains(v),
            Self::Negative(set) => !set.contains(v),
        }
    }

    /// Unwrap the set contained in a positive term.
    /// Will panic if used on a negative term.
    pub(crate) fn unwrap_positive(&self) -> &VS {
        match self {
            Self::Positive(set) => set,
            Self::Negative(_) => panic!("called unwrap_positive on a negative term"),
        }
    }

    /// Unwrap the set contained in a negative term.
    /// Will panic if used on a positive term.
    pub(crate) fn unwrap_negative(&self) -> &VS {
        match self {
            Self::Negative(set) => set,
            Self::Positive(_) => panic!("called unwrap_negative on a positive term"),
        }
    }
}

/// Set operations with terms.
impl<VS: VersionSet> Term<VS> {
    /// Compute the intersection of two terms.
    ///
    /// The intersection is positive if at least one of the two terms is positive.
    pub(crate) fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Positive(r1), Self::Positive(r2)) => Self::Positive(r1.intersection(r2)),
            (Self::Positive(p), Self::Negative(n)) | (Self::Negative(n), Self::Positive(p)) => {
                Self::Positive(p.intersection(&n.complement()))
            }
            (Self::Negative(r1), Self::Negative(r2)) => Self::Negative(r1.union(r2)),
        }
    }

    /// Compute the union of two terms.
    /// If at least one term is negative, the union is negative (De Morgan).
    pub(crate) fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Positive(r1), Self::Positive(r2)) => Self::Positive(r1.union(r2)),
            (Self::Positive(p), Self::Negative(n)) | (Self::Negative(n), Self::Positive(p)) => {
                Self::Negative(p.complement().intersection(n))
            }
            (Self::Negative(r1), Self::Negative(r2)) => Self::Negative(r1.intersection(r2)),
        }
    }

    /// Check whether two terms are mutually exclusive.
    pub(crate) fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Positive(r1), Self::Positive(r2)) => r1.is_disjoint(r2),
            // Two negative terms are disjoint only if the union of their sets
            // covers every version, since both exclude everything they cover.
            (Self::Negative(r1), Self::Negative(r2)) => r1.union(r2) == VS::full(),
            (Self::Positive(p), Self::Negative(n)) | (Self::Negative(n), Self::Positive(p)) => {
                p.subset_of(n)
            }
        }
    }

    /// Check whether every assignment satisfying `self` also satisfies `other`.
    pub(crate) fn subset_of(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Positive(r1), Self::Positive(r2)) => r1.subset_of(r2),
            (Self::Positive(r1), Self::Negative(r2)) => r1.is_disjoint(r2),
            // A negative term is satisfied by the absence of a version,
            // which a positive term never accepts.
            (Self::Negative(_), Self::Positive(_)) => false,
            (Self::Negative(r1), Self::Negative(r2)) => r2.subset_of(r1),
        }
    }
}

/// Describe a relation between a set of terms S and another term t.
///
/// As a shorthand, we say that a term v
/// satisfies or contradicts a term t if {v} satisfies or contradicts it.
#[derive(Eq, PartialEq, Debug)]
pub(crate) enum Relation {
    /// We say that S "satisfies" t if t must be true whenever every term in S is true.
    Satisfied,
    /// Conversely, S "contradicts" t if t must be false whenever every term in S is true.
    Contradicted,
    /// If neither of these is true we say that S is "inconclusive" for t.
    Inconclusive,
}

/// Relation between terms.
impl<VS: VersionSet> Term<VS> {
    /// Check if a set of terms satisfies or contradicts a given term.
    /// Otherwise the relation is inconclusive.
    pub(crate) fn relation_with(&self, other_terms_intersection: &Self) -> Relation {
        if other_terms_intersection.subset_of(self) {
            Relation::Satisfied
        } else if self.is_disjoint(other_terms_intersection) {
            Relation::Contradicted
        } else {
            Relation::Inconclusive
        }
    }
}

impl<VS: VersionSet> Display for Term<VS> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Positive(set) => write!(f, "{}", set),
            Self::Negative(set) => write!(f, "Not ( {} )", set),
        }
    }
}

// TESTS #######################################################################

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Ranges;

    pub fn strategy() -> impl Strategy<Value = Term<Ranges<u32>>> {
        prop_oneof![
            concord_ranges::testing::proptest_strategy().prop_map(Term::Positive),
            concord_ranges::testing::proptest_strategy().prop_map(Term::Negative),
        ]
    }

    proptest! {
        /// Double negation is identity.
        #[test]
        fn double_negate_is_identity(term in strategy()) {
            prop_assert_eq!(term.negate().negate(), term);
        }

        /// Negation flips the polarity and nothing else.
        #[test]
        fn negate_flips_polarity(set in concord_ranges::testing::proptest_strategy()) {
            prop_assert_eq!(
                Term::Positive(set.clone()).negate(),
                Term::<Ranges<u32>>::Negative(set)
            );
        }

        /// `any` is the identity of intersection.
        #[test]
        fn any_is_identity_of_intersection(term in strategy()) {
            prop_assert_eq!(term.intersection(&Term::any()), term);
        }

        /// `empty` absorbs under intersection.
        #[test]
        fn empty_absorbs_intersection(term in strategy()) {
            prop_assert_eq!(term.intersection(&Term::empty()), Term::empty());
        }

        /// Intersection is commutative.
        #[test]
        fn intersection_is_commutative(t1 in strategy(), t2 in strategy()) {
            prop_assert_eq!(t1.intersection(&t2), t2.intersection(&t1));
        }

        /// Intersection is associative.
        #[test]
        fn intersection_is_associative(t1 in strategy(), t2 in strategy(), t3 in strategy()) {
            prop_assert_eq!(
                t1.intersection(&t2).intersection(&t3),
                t1.intersection(&t2.intersection(&t3))
            );
        }

        /// Intersection evaluates pointwise like boolean "and".
        #[test]
        fn intersection_contains(t1 in strategy(), t2 in strategy(), v in any::<u32>()) {
            prop_assert_eq!(
                t1.intersection(&t2).contains(&v),
                t1.contains(&v) && t2.contains(&v)
            );
        }

        /// Union evaluates pointwise like boolean "or".
        #[test]
        fn union_contains(t1 in strategy(), t2 in strategy(), v in any::<u32>()) {
            prop_assert_eq!(
                t1.union(&t2).contains(&v),
                t1.contains(&v) || t2.contains(&v)
            );
        }

        /// A satisfied relation implies pointwise containment.
        #[test]
        fn satisfied_implies_containment(t1 in strategy(), t2 in strategy(), v in any::<u32>()) {
            if t1.relation_with(&t2) == Relation::Satisfied && t2.contains(&v) {
                prop_assert!(t1.contains(&v));
            }
        }

        /// A contradicted relation implies pointwise exclusion.
        #[test]
        fn contradicted_implies_exclusion(t1 in strategy(), t2 in strategy(), v in any::<u32>()) {
            if t1.relation_with(&t2) == Relation::Contradicted && t2.contains(&v) {
                prop_assert!(!t1.contains(&v));
            }
        }

        /// `exact` accepts exactly its version.
        #[test]
        fn exact_contains_only_itself(v in any::<u32>(), u in any::<u32>()) {
            prop_assert_eq!(Term::<Ranges<u32>>::exact(v).contains(&u), u == v);
        }
    }
}
