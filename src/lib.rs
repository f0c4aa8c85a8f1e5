// SPDX-License-Identifier: MPL-2.0

//! Conflict-driven version solving for package dependency graphs.
//!
//! Given a root package and version, and a [DependencyProvider] describing the
//! package universe (which versions of each package exist, and which
//! constraints each version puts on other packages), [resolve] computes an
//! assignment of one version per package that satisfies every transitive
//! requirement, or proves that none exists.
//!
//! The resolver is a CDCL-style solver in the lineage of PubGrub: it
//! interleaves unit propagation over a set of learned *incompatibilities*,
//! priority-driven decision making, and conflict resolution with
//! non-chronological backjumping. When resolution is impossible, the failure
//! carries a structured derivation tree tracing the terminal incompatibility
//! back to the external facts that produced it.
//!
//! ## Example
//!
//! ```
//! # use concord::{resolve, OfflineDependencyProvider, Ranges};
//! #
//! let mut provider = OfflineDependencyProvider::<&str, Ranges<u32>>::new();
//! provider.add_dependencies("root", 1u32, [("leaf", Ranges::between(1u32, 3u32))]);
//! provider.add_dependencies("leaf", 1u32, []);
//! provider.add_dependencies("leaf", 2u32, []);
//!
//! let solution = resolve(&provider, "root", 1u32).unwrap();
//! assert_eq!(solution.get("leaf"), Some(&2));
//! ```
//!
//! Where `provider` supplies the list of available packages and versions, as
//! well as the dependencies of every available package, by implementing the
//! [DependencyProvider] trait. The call to [resolve] for a given package at a
//! given version will compute the set of packages and versions needed to
//! satisfy the dependencies of that package and version pair. If there is no
//! solution, a [derivation tree](DerivationTree) explains why.

mod error;
mod package;
mod provider;
mod report;
mod solver;
mod term;
mod type_aliases;
mod version_set;

pub(crate) mod internal;

pub use concord_ranges::Ranges;
pub use error::{NoSolutionError, ResolveError};
pub use package::Package;
pub use provider::OfflineDependencyProvider;
pub use report::{DerivationTree, Derived, External};
pub use solver::{resolve, Dependencies, DependencyProvider, PackageResolutionStatistics};
pub use term::Term;
pub use type_aliases::{DependencyConstraints, Map, SelectedDependencies, Set};
pub use version_set::VersionSet;
