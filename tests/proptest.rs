// SPDX-License-Identifier: MPL-2.0

//! Property tests pitting the resolver against an exhaustive reference
//! solver on randomly generated dependency registries.
//!
//! The reference solver is a naive depth-first search trying every version of
//! every constrained package. It is complete (it finds a solution whenever
//! one exists), so agreement on satisfiability checks both soundness and
//! completeness of the real resolver.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use concord::{
    resolve, Dependencies, DependencyProvider, OfflineDependencyProvider, Ranges, ResolveError,
};

type R = Ranges<u32>;
type Provider = OfflineDependencyProvider<u32, R>;

const N_PACKAGES: u32 = 5;
const MAX_VERSION: u32 = 4;

/// A randomly generated universe: available versions per package, plus raw
/// dependency edges. Edges whose source package-version does not exist are
/// simply dropped when building the provider.
#[derive(Debug, Clone)]
struct Registry {
    versions: Vec<BTreeSet<u32>>,
    edges: Vec<((u32, u32), (u32, R))>,
}

fn range_strategy() -> impl Strategy<Value = R> {
    prop_oneof![
        Just(Ranges::full()),
        (0..=MAX_VERSION).prop_map(|v| Ranges::singleton(v)),
        (0..=MAX_VERSION, 0..=MAX_VERSION)
            .prop_map(|(a, b)| Ranges::between(a.min(b), a.max(b) + 1)),
        (0..=MAX_VERSION).prop_map(|v| Ranges::higher_than(v)),
        (0..=MAX_VERSION).prop_map(|v| Ranges::strictly_lower_than(v)),
    ]
}

fn registry_strategy() -> impl Strategy<Value = Registry> {
    (
        prop::collection::vec(
            prop::collection::btree_set(0..=MAX_VERSION, 1..4),
            N_PACKAGES as usize,
        ),
        prop::collection::vec(
            ((0..N_PACKAGES, 0..=MAX_VERSION), (0..N_PACKAGES, range_strategy())),
            0..16,
        ),
    )
        .prop_map(|(versions, edges)| Registry { versions, edges })
}

fn build_provider(registry: &Registry) -> Provider {
    let mut provider = Provider::new();
    for (package, versions) in registry.versions.iter().enumerate() {
        let package = package as u32;
        for &version in versions {
            let dependencies: BTreeMap<u32, R> = registry
                .edges
                .iter()
                .filter(|((p, v), _)| *p == package && *v == version)
                .map(|(_, (dep, range))| (*dep, range.clone()))
                .collect();
            provider.add_dependencies(package, version, dependencies);
        }
    }
    provider
}

fn root_version(registry: &Registry) -> u32 {
    *registry.versions[0].iter().next_back().unwrap()
}

/// Depth-first exhaustive search. `pending` is the worklist of constraints
/// still to honor; both `pending` and `assignment` are restored on failure so
/// the caller can try another branch.
fn naive_solve(
    provider: &Provider,
    pending: &mut Vec<(u32, R)>,
    assignment: &mut BTreeMap<u32, u32>,
) -> bool {
    let Some((package, range)) = pending.pop() else {
        return true;
    };
    if let Some(&version) = assignment.get(&package) {
        let ok = range.contains(&version) && naive_solve(provider, pending, assignment);
        if !ok {
            pending.push((package, range));
        }
        return ok;
    }
    let versions: Vec<u32> = provider
        .versions(&package)
        .map(|it| it.copied().collect())
        .unwrap_or_default();
    for version in versions.into_iter().rev() {
        if !range.contains(&version) {
            continue;
        }
        let Dependencies::Available(dependencies) =
            provider.get_dependencies(&package, &version).unwrap()
        else {
            continue;
        };
        assignment.insert(package, version);
        let pending_before = pending.len();
        pending.extend(dependencies);
        if naive_solve(provider, pending, assignment) {
            return true;
        }
        pending.truncate(pending_before);
        assignment.remove(&package);
    }
    pending.push((package, range));
    false
}

fn naive_resolve(provider: &Provider, root: u32, version: u32) -> Option<BTreeMap<u32, u32>> {
    let mut pending = vec![(root, Ranges::singleton(version))];
    let mut assignment = BTreeMap::new();
    naive_solve(provider, &mut pending, &mut assignment).then_some(assignment)
}

/// Every selected version must exist, the root must be pinned, and every
/// dependency of every selected version must be satisfied by the solution.
fn assert_solution_sound(
    provider: &Provider,
    solution: &BTreeMap<u32, u32>,
    root: u32,
    version: u32,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(solution.get(&root), Some(&version));
    for (package, version) in solution {
        let known: Vec<u32> = provider
            .versions(package)
            .map(|it| it.copied().collect())
            .unwrap_or_default();
        prop_assert!(known.contains(version), "{} {} does not exist", package, version);
        let Dependencies::Available(dependencies) =
            provider.get_dependencies(package, version).unwrap()
        else {
            panic!("{package} {version} has no dependency record");
        };
        for (dependency, range) in dependencies {
            let selected = solution.get(&dependency);
            prop_assert!(
                selected.is_some_and(|selected| range.contains(selected)),
                "{} {} needs {} in {}, got {:?}",
                package,
                version,
                dependency,
                range,
                selected
            );
        }
    }
    Ok(())
}

proptest! {
    /// The resolver and the exhaustive search agree on satisfiability, and
    /// whenever the resolver finds a solution it is a valid one.
    #[test]
    fn agrees_with_exhaustive_search(registry in registry_strategy()) {
        let provider = build_provider(&registry);
        let version = root_version(&registry);
        let resolved = resolve(&provider, 0u32, version);
        let reference = naive_resolve(&provider, 0, version);
        match (&resolved, &reference) {
            (Ok(solution), Some(_)) => {
                let solution: BTreeMap<u32, u32> = solution.iter().map(|(p, v)| (*p, *v)).collect();
                assert_solution_sound(&provider, &solution, 0, version)?;
            }
            (Err(ResolveError::NoSolution(_)), None) => {}
            (resolved, reference) => {
                prop_assert!(
                    false,
                    "solver and exhaustive search disagree: {:?} vs {:?}",
                    resolved,
                    reference
                );
            }
        }
    }

    /// Identical inputs give identical outputs, run after run.
    #[test]
    fn resolution_is_deterministic(registry in registry_strategy()) {
        let provider = build_provider(&registry);
        let version = root_version(&registry);
        let first = resolve(&provider, 0u32, version);
        let second = resolve(&provider, 0u32, version);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(ResolveError::NoSolution(_)), Err(ResolveError::NoSolution(_))) => {}
            (a, b) => prop_assert!(false, "different outcomes: {:?} vs {:?}", a, b),
        }
    }
}
