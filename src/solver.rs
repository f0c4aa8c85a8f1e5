// SPDX-License-Identifier: MPL-2.0

//! The version solving algorithm and the provider interface it is generic
//! over.
//!
//! Version solving consists in finding a set of packages and versions that
//! satisfy all the constraints of a given project dependency graph. The
//! algorithm is conflict-driven: it alternates unit propagation of everything
//! it knows, decision making on the highest-priority undecided package, and,
//! when a conflict arises, learning a new incompatibility and backjumping
//! non-chronologically to the decision level where that incompatibility
//! becomes unit again.
//!
//! The algorithm is generic over packages (P), versions (V) and version sets
//! (VS) through the [DependencyProvider] trait.

use std::collections::BTreeSet as Set;
use std::error::Error;
use std::fmt::{Debug, Display};

use log::{debug, info};

use crate::internal::{Id, Incompatibility, State};
use crate::{
    DependencyConstraints, Map, Package, ResolveError, SelectedDependencies, Term, VersionSet,
};

/// Main function of the library.
/// Finds a set of packages satisfying dependency bounds for a given package + version pair.
#[cold]
pub fn resolve<DP: DependencyProvider>(
    dependency_provider: &DP,
    package: DP::P,
    version: impl Into<DP::V>,
) -> Result<SelectedDependencies<DP>, ResolveError<DP>> {
    let mut state: State<DP> = State::init(package.clone(), version.into());
    let mut conflict_tracker: Map<Id<DP::P>, PackageResolutionStatistics> = Map::default();
    let mut added_dependencies: Map<Id<DP::P>, Set<DP::V>> = Map::default();
    let mut next = state.root_package;
    loop {
        dependency_provider
            .should_cancel()
            .map_err(ResolveError::ErrorInShouldCancel)?;

        info!(
            "unit_propagation: {:?} = '{}'",
            &next, state.package_store[next]
        );
        let satisfier_causes = state
            .unit_propagation(next)
            .map_err(ResolveError::NoSolution)?;
        for (affected, incompat) in satisfier_causes {
            conflict_tracker
                .entry(affected)
                .or_default()
                .unit_propagation_affected += 1;
            for (conflict_package, _) in state.incompatibility_store[incompat].iter() {
                if conflict_package == affected {
                    continue;
                }
                conflict_tracker
                    .entry(conflict_package)
                    .or_default()
                    .unit_propagation_culprit += 1;
            }
        }

        debug!(
            "partial solution after unit propagation: {}",
            state.partial_solution.display(&state.package_store)
        );

        let Some(highest_priority_pkg) =
            state.partial_solution.pick_highest_priority_pkg(|p, r| {
                dependency_provider.prioritize(
                    &state.package_store[p],
                    r,
                    conflict_tracker.entry(p).or_default(),
                )
            })
        else {
            return Ok(state
                .partial_solution
                .extract_solution()
                .map(|(p, v)| (state.package_store[p].clone(), v))
                .collect());
        };
        next = highest_priority_pkg;

        let term_intersection = state
            .partial_solution
            .term_intersection_for_package(next)
            .ok_or_else(|| {
                ResolveError::Failure("a package was chosen but we don't have a term".into())
            })?;
        let decision = dependency_provider
            .choose_version(&state.package_store[next], term_intersection.unwrap_positive())
            .map_err(|err| ResolveError::ErrorChoosingVersion {
                package: state.package_store[next].clone(),
                source: err,
            })?;

        info!(
            "chose: {:?} = '{}' @ {:?}",
            &next, state.package_store[next], decision
        );

        // Pick the next compatible version.
        let v = match decision {
            None => {
                // No version of this package fits the accumulated constraint:
                // record it so propagation steers away from the constraint.
                let inc = Incompatibility::no_versions(next, term_intersection.clone());
                state.add_incompatibility(inc);
                continue;
            }
            Some(x) => x,
        };

        if !term_intersection.contains(&v) {
            return Err(ResolveError::Failure(
                "choose_version picked a version outside the requested range".into(),
            ));
        }

        let is_new_dependency = added_dependencies
            .entry(next)
            .or_default()
            .insert(v.clone());

        if is_new_dependency {
            // Retrieve that package dependencies.
            let p = next;
            let dependencies = dependency_provider
                .get_dependencies(&state.package_store[p], &v)
                .map_err(|err| ResolveError::ErrorRetrievingDependencies {
                    package: state.package_store[p].clone(),
                    version: v.clone(),
                    source: err,
                })?;

            let dependencies = match dependencies {
                Dependencies::Unavailable(reason) => {
                    info!(
                        "version {} of {} is unavailable: {}",
                        v, state.package_store[p], reason
                    );
                    // The version itself cannot be used, which is the same
                    // situation as the version not existing at all.
                    state.add_incompatibility(Incompatibility::no_versions(
                        p,
                        Term::Positive(<DP::VS as VersionSet>::singleton(v.clone())),
                    ));
                    continue;
                }
                Dependencies::Available(x) => x,
            };

            // Add the package version and its dependencies if the dependencies
            // are not conflicting with the partial solution.
            if let Some(conflict) = state.add_package_version_dependencies(p, v.clone(), dependencies)
            {
                conflict_tracker
                    .entry(p)
                    .or_default()
                    .dependencies_affected += 1;
                for (incompat_package, _) in state.incompatibility_store[conflict].iter() {
                    if incompat_package == p {
                        continue;
                    }
                    conflict_tracker
                        .entry(incompat_package)
                        .or_default()
                        .dependencies_culprit += 1;
                }
            }
        } else {
            // `dep_incompats` are already in `incompatibilities` so we know there are not satisfied
            // terms and can add the decision directly.
            info!(
                "add_decision (not first time): {:?} = '{}' @ {}",
                &next, state.package_store[next], v
            );
            state.partial_solution.add_decision(next, v);
        }
    }
}

/// An enum used by [DependencyProvider] that holds information about package dependencies.
/// For each [Package] there is a set of versions allowed as a dependency.
#[derive(Clone)]
pub enum Dependencies<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    /// Package dependencies are unavailable with the reason why they are missing.
    Unavailable(M),
    /// Container for all available package versions.
    Available(DependencyConstraints<P, VS>),
}

/// Some statistics about how much trouble the resolver has had with a package.
///
/// All counters relate to conflicts, so they stay at zero while resolution
/// proceeds without backtracking. A provider will typically only consume
/// [conflict_count](Self::conflict_count) in its `prioritize` implementation.
#[derive(Clone, Default)]
pub struct PackageResolutionStatistics {
    /// Number of conflict causes learned with this package as the pivot.
    unit_propagation_affected: u32,
    /// Number of conflict causes whose incompatibility mentions this package
    /// other than as the pivot.
    unit_propagation_culprit: u32,
    /// Number of this package's versions rejected at dependency ingestion.
    dependencies_affected: u32,
    /// Number of rejections at dependency ingestion this package contributed
    /// to for another package.
    dependencies_culprit: u32,
}

impl PackageResolutionStatistics {
    /// The number of conflicts this package was involved in.
    ///
    /// Processing packages with a high conflict count earlier usually speeds up resolution.
    ///
    /// Note: The exact values depend on implementation details of the resolver.
    /// So should not be relied on and may change between any lock file update.
    pub fn conflict_count(&self) -> u32 {
        self.unit_propagation_affected
            + self.unit_propagation_culprit
            + self.dependencies_affected
            + self.dependencies_culprit
    }
}

/// Trait that allows the algorithm to retrieve available packages and their dependencies.
/// An implementor needs to be supplied to the [resolve] function.
pub trait DependencyProvider {
    /// How this provider stores the name of the packages.
    type P: Package;

    /// How this provider stores the versions of the packages.
    type V: Debug + Display + Clone + Ord;

    /// How this provider stores the version requirements for the packages.
    /// The requirements must be able to process the same kind of version as this dependency provider.
    ///
    /// A common choice is [`Ranges`][crate::Ranges].
    type VS: VersionSet<V = Self::V>;

    /// Type for custom incompatibilities.
    ///
    /// There are reasons in user code outside the resolver that can cause packages or versions
    /// to be unavailable. Examples:
    /// * The version would require building the package, but builds are disabled.
    /// * The package is not available in the cache, but internet access has been disabled.
    /// * The package uses a legacy format not supported anymore.
    ///
    /// The intended use is to track them in an enum and assign them to this type. You can also
    /// assign [`String`] as placeholder.
    type M: Eq + Clone + Debug + Display;

    /// The type returned from `prioritize`. The resolver does not care what type this is
    /// as long as it can pick a largest one and clone it.
    ///
    /// [`Reverse`](std::cmp::Reverse) can be useful if you want to pick the package with
    /// the fewest versions that match the outstanding constraint.
    type Priority: Ord + Clone;

    /// The kind of error returned from these methods.
    ///
    /// Returning this signals that resolution should fail with this error.
    type Err: Error + 'static;

    /// Decision making is the process of choosing the next package
    /// and version that will be appended to the partial solution.
    ///
    /// Every time such a decision must be made, the resolver looks at all the potential valid
    /// packages that have changed, and asks the dependency provider how important each one is.
    /// For each one it calls `prioritize` with the name of the package, the current set of
    /// acceptable versions, and some statistics about how much trouble the resolver has had with
    /// that package. The resolver will then pick the package with the highest priority from all
    /// the potential valid packages.
    ///
    /// The strategy employed to prioritize packages
    /// cannot change the existence of a solution or not,
    /// but can drastically change the performances of the solver,
    /// or the properties of the solution.
    /// A common heuristic is to prefer the package involved in the most
    /// conflicts with the fewest versions left inside the current set: those
    /// run out of versions to try more quickly, so conflicts surface earlier.
    ///
    /// Note: the resolver may call this even when the range has not changed,
    /// if it is more efficient for the resolver's internal data structures.
    fn prioritize(
        &self,
        package: &Self::P,
        range: &Self::VS,
        package_statistics: &PackageResolutionStatistics,
    ) -> Self::Priority;

    /// Once the resolver has found the highest `Priority` package from all potential valid
    /// packages, it needs to know what version of that package to use.
    ///
    /// Returns the highest version of `package` contained in `range`, or
    /// `None` if no such version exists. Returning anything other than the
    /// highest contained version loses the "prefer latest" property of the
    /// resolver; returning a version outside `range` is a contract violation
    /// and aborts resolution.
    fn choose_version(
        &self,
        package: &Self::P,
        range: &Self::VS,
    ) -> Result<Option<Self::V>, Self::Err>;

    /// Retrieves the package dependencies.
    /// Return [Dependencies::Unavailable] if its dependencies are unavailable.
    #[allow(clippy::type_complexity)]
    fn get_dependencies(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS, Self::M>, Self::Err>;

    /// This is called fairly regularly during the resolution,
    /// if it returns an Err then resolution will be terminated.
    /// This is helpful if you want to add some form of early termination like a timeout,
    /// or you want to add some form of user feedback if things are taking a while.
    /// If not provided the resolver will run as long as needed.
    fn should_cancel(&self) -> Result<(), Self::Err> {
        Ok(())
    }
}
