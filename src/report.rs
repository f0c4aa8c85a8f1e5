// SPDX-License-Identifier: MPL-2.0

//! The structured report returned when no solution exists.
//!
//! Rendering the report into prose is intentionally left to callers. The tree
//! itself carries everything needed: the external facts resolution learned
//! from the provider, and the incompatibilities derived from them on the way
//! to the terminal one.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use crate::{Map, Package, Term, VersionSet};

/// Derivation tree resulting in the impossibility to solve the dependencies
/// of the root package.
#[derive(Debug, Clone)]
pub enum DerivationTree<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    /// External incompatibility: a fact the solver learned from outside,
    /// not the result of conflict resolution.
    External(External<P, VS, M>),
    /// Incompatibility derived from two others during conflict resolution.
    Derived(Derived<P, VS, M>),
}

/// Incompatibilities that are not derived from others,
/// they have their own reason.
#[derive(Debug, Clone)]
pub enum External<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    /// Initial incompatibility aiming at picking the root package for the
    /// first decision.
    NotRoot(P, VS::V),
    /// There are no versions in the given set for this package.
    NoVersions(P, VS),
    /// Incompatibility coming from the dependencies of a given package.
    FromDependencyOf(P, VS, P, VS),
    /// The package is unavailable for reasons outside this library.
    Custom(P, VS, M),
}

/// Incompatibility derived from two others.
#[derive(Debug, Clone)]
pub struct Derived<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    /// Terms of the derived incompatibility.
    pub terms: Map<P, Term<VS>>,
    /// Indicate if the incompatibility is present multiple times
    /// in the derivation tree.
    /// If that is the case, it has a unique id, provided in that option.
    /// Then, we may want to only explain it once,
    /// and refer to the explanation for the other times.
    pub shared_id: Option<usize>,
    /// First cause.
    pub cause1: Arc<DerivationTree<P, VS, M>>,
    /// Second cause.
    pub cause2: Arc<DerivationTree<P, VS, M>>,
}

impl<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> Display
    for External<P, VS, M>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotRoot(package, version) => {
                write!(f, "we are solving dependencies of {} {}", package, version)
            }
            Self::NoVersions(package, set) => {
                if set == &VS::full() {
                    write!(f, "there is no available version for {}", package)
                } else {
                    write!(f, "there is no version of {} in {}", package, set)
                }
            }
            Self::FromDependencyOf(package, package_set, dependency, dependency_set) => {
                if package_set == &VS::full() {
                    write!(f, "{} depends on {} {}", package, dependency, dependency_set)
                } else {
                    write!(
                        f,
                        "{} {} depends on {} {}",
                        package, package_set, dependency, dependency_set
                    )
                }
            }
            Self::Custom(package, set, metadata) => {
                if set == &VS::full() {
                    write!(f, "dependencies of {} are unavailable {}", package, metadata)
                } else {
                    write!(
                        f,
                        "dependencies of {} at {} are unavailable {}",
                        package, set, metadata
                    )
                }
            }
        }
    }
}
