// SPDX-License-Identifier: MPL-2.0

//! A ready-made [DependencyProvider] over an in-memory package universe.
//!
//! This is what the test suites resolve against, and a reasonable template
//! for writing a real provider.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::{
    Dependencies, DependencyConstraints, DependencyProvider, Map, Package,
    PackageResolutionStatistics, VersionSet,
};

/// A [DependencyProvider] holding the whole dependency graph in memory.
///
/// Versions are kept per package in a `BTreeMap`, so they can be scanned from
/// the newest end in [choose_version](DependencyProvider::choose_version).
/// Dependency lists are [DependencyConstraints], whose insertion order is the
/// order versions were registered with; handing them back unchanged is what
/// keeps resolution deterministic run after run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "VS::V: serde::Serialize, VS: serde::Serialize, P: serde::Serialize",
        deserialize = "VS::V: serde::Deserialize<'de>, VS: serde::Deserialize<'de>, P: serde::Deserialize<'de>"
    ))
)]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OfflineDependencyProvider<P: Package, VS: VersionSet> {
    dependencies: Map<P, BTreeMap<VS::V, DependencyConstraints<P, VS>>>,
}

impl<P: Package, VS: VersionSet> OfflineDependencyProvider<P, VS> {
    /// Creates a provider knowing no package at all.
    pub fn new() -> Self {
        Self {
            dependencies: Map::default(),
        }
    }

    /// Registers a package version together with its complete dependency
    /// list.
    ///
    /// Registering the same package and version again replaces the previous
    /// list wholesale. There is deliberately no way to append dependencies
    /// one at a time: the resolver takes a
    /// [get_dependencies](DependencyProvider::get_dependencies) answer as the
    /// full set of requirements of that version, so a partially registered
    /// version would silently resolve against incomplete constraints.
    pub fn add_dependencies<I: IntoIterator<Item = (P, VS)>>(
        &mut self,
        package: P,
        version: impl Into<VS::V>,
        dependencies: I,
    ) {
        let package_deps = dependencies.into_iter().collect();
        let v = version.into();
        *self
            .dependencies
            .entry(package)
            .or_default()
            .entry(v)
            .or_default() = package_deps;
    }

    /// Iterates over the registered packages, in no particular order.
    pub fn packages(&self) -> impl Iterator<Item = &P> {
        self.dependencies.keys()
    }

    /// Iterates over the registered versions of `package`, oldest first, or
    /// [None] if the package is unknown.
    pub fn versions(&self, package: &P) -> Option<impl Iterator<Item = &VS::V>> {
        self.dependencies.get(package).map(|k| k.keys())
    }

    /// The registered dependency list of a package version, or [None] if that
    /// exact pair was never registered.
    fn dependencies(&self, package: &P, version: &VS::V) -> Option<DependencyConstraints<P, VS>> {
        self.dependencies.get(package)?.get(version).cloned()
    }
}

impl<P: Package, VS: VersionSet> DependencyProvider for OfflineDependencyProvider<P, VS> {
    type P = P;
    type V = VS::V;
    type VS = VS;
    type M = String;

    type Err = Infallible;

    /// Scan the ordered version list from the newest end and stop at the
    /// first version the set accepts, which is the highest one: exactly the
    /// prefer-latest contract of the trait.
    #[inline]
    fn choose_version(&self, package: &P, range: &VS) -> Result<Option<VS::V>, Infallible> {
        Ok(self
            .dependencies
            .get(package)
            .and_then(|versions| versions.keys().rev().find(|v| range.contains(v)).cloned()))
    }

    type Priority = (u32, Reverse<usize>);

    /// Rank packages by how much trouble they are in.
    ///
    /// A package whose current set matches no registered version at all gets
    /// the maximum priority: deciding it next makes the driver record its
    /// `NoVersions` incompatibility immediately, before more decisions pile
    /// on top of the dead end and have to be unwound again.
    ///
    /// Otherwise the first key is [PackageResolutionStatistics::conflict_count],
    /// the sum of the four per-package conflict counters the driver maintains:
    /// a package that keeps showing up in learned causes or rejected
    /// ingestions is the bottleneck of the search, and deciding it early
    /// keeps backjumps short. The tiebreaker prefers the fewest versions
    /// still inside the set, since those packages exhaust their candidates
    /// (and thereby surface conflicts) soonest.
    #[inline]
    fn prioritize(
        &self,
        package: &Self::P,
        range: &Self::VS,
        package_statistics: &PackageResolutionStatistics,
    ) -> Self::Priority {
        let version_count = self
            .dependencies
            .get(package)
            .map(|versions| versions.keys().filter(|v| range.contains(v)).count())
            .unwrap_or(0);
        if version_count == 0 {
            return (u32::MAX, Reverse(0));
        }
        (package_statistics.conflict_count(), Reverse(version_count))
    }

    /// Answer with the registered dependency list, or [Dependencies::Unavailable]
    /// for a package version this provider never heard of.
    #[inline]
    fn get_dependencies(
        &self,
        package: &P,
        version: &VS::V,
    ) -> Result<Dependencies<P, VS, Self::M>, Infallible> {
        Ok(match self.dependencies(package, version) {
            None => Dependencies::Unavailable(
                "no dependency record for this package version".to_string(),
            ),
            Some(dependencies) => Dependencies::Available(dependencies),
        })
    }
}
