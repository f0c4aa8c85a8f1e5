// SPDX-License-Identifier: MPL-2.0

//! Core model and functions
//! to write a functional PubGrub-style algorithm.

use std::sync::Arc;

use crate::internal::{
    Arena, DecisionLevel, HashArena, Id, IncompDpId, Incompatibility, PartialSolution, Relation,
    SatisfierSearch, SmallVec,
};
use crate::{DependencyProvider, DerivationTree, Map, NoSolutionError, Set, Term, VersionSet};

/// Current state of the resolution: all incompatibilities indexed by package,
/// the partial solution, and the stores giving ids their meaning.
pub(crate) struct State<DP: DependencyProvider> {
    pub(crate) root_package: Id<DP::P>,
    root_version: DP::V,

    /// All incompatibilities mentioning each package.
    #[allow(clippy::type_complexity)]
    incompatibilities: Map<Id<DP::P>, Vec<IncompDpId<DP>>>,

    /// As an optimization, store the ids of incompatibilities that are already
    /// contradicted. For each one keep track of the decision level when it was
    /// found to be contradicted: those entries are cleared again when
    /// backtracking above that level.
    contradicted_incompatibilities: Map<IncompDpId<DP>, DecisionLevel>,

    /// All incompatibilities expressing dependencies,
    /// with common dependents merged.
    #[allow(clippy::type_complexity)]
    merged_dependencies: Map<(Id<DP::P>, Id<DP::P>), SmallVec<IncompDpId<DP>>>,

    /// Partial solution.
    pub(crate) partial_solution: PartialSolution<DP>,

    /// The store is the reference storage for all incompatibilities.
    pub(crate) incompatibility_store: Arena<Incompatibility<DP::P, DP::VS, DP::M>>,

    /// The store is the reference storage for all packages.
    pub(crate) package_store: HashArena<DP::P>,

    /// This is a stack of work to be done in `unit_propagation`.
    /// It can definitely be a local variable to that function, but
    /// this version prevents reallocation.
    unit_propagation_buffer: SmallVec<Id<DP::P>>,
}

impl<DP: DependencyProvider> State<DP> {
    /// Initialization of the solver state with the root package and version.
    pub(crate) fn init(root_package: DP::P, root_version: DP::V) -> Self {
        let mut incompatibility_store = Arena::new();
        let mut package_store = HashArena::new();
        let root_package = package_store.alloc(root_package);
        let not_root_id = incompatibility_store.alloc(Incompatibility::not_root(
            root_package,
            root_version.clone(),
        ));
        let mut incompatibilities = Map::default();
        incompatibilities.insert(root_package, vec![not_root_id]);
        Self {
            root_package,
            root_version,
            incompatibilities,
            contradicted_incompatibilities: Map::default(),
            merged_dependencies: Map::default(),
            partial_solution: PartialSolution::empty(),
            incompatibility_store,
            package_store,
            unit_propagation_buffer: SmallVec::empty(),
        }
    }

    /// Add the dependencies of a package version, and decide on that version
    /// if none of the new incompatibilities immediately conflicts with the
    /// partial solution.
    ///
    /// Returns the conflicting incompatibility when the version was rejected.
    pub(crate) fn add_package_version_dependencies(
        &mut self,
        package: Id<DP::P>,
        version: DP::V,
        dependencies: impl IntoIterator<Item = (DP::P, DP::VS)>,
    ) -> Option<IncompDpId<DP>> {
        let dep_incompats =
            self.add_incompatibility_from_dependencies(package, version.clone(), dependencies);
        self.partial_solution.add_package_version_incompatibilities(
            package,
            version,
            dep_incompats,
            &self.incompatibility_store,
        )
    }

    /// Add incompatibilities of a package version's dependencies, one
    /// incompatibility per dependency edge. Returns the half-open range of
    /// ids allocated by this call.
    fn add_incompatibility_from_dependencies(
        &mut self,
        package: Id<DP::P>,
        version: DP::V,
        dependencies: impl IntoIterator<Item = (DP::P, DP::VS)>,
    ) -> std::ops::Range<IncompDpId<DP>> {
        // Create incompatibilities and allocate them in the store.
        let package_store = &mut self.package_store;
        let new_incompats_id_range =
            self.incompatibility_store
                .alloc_iter(dependencies.into_iter().map(|dep| {
                    let dep_pkg = package_store.alloc(dep.0);
                    Incompatibility::from_dependency(
                        package,
                        <DP::VS as VersionSet>::singleton(version.clone()),
                        (dep_pkg, dep.1),
                    )
                }));
        // Merge the newly created incompatibilities with the older ones.
        for id in IncompDpId::<DP>::range_to_iter(new_incompats_id_range.clone()) {
            self.merge_incompatibility(id);
        }
        new_incompats_id_range
    }

    /// Add an incompatibility to the state.
    pub(crate) fn add_incompatibility(
        &mut self,
        incompat: Incompatibility<DP::P, DP::VS, DP::M>,
    ) {
        let id = self.incompatibility_store.alloc(incompat);
        self.merge_incompatibility(id);
    }

    /// Unit propagation is the core mechanism of the solving algorithm.
    ///
    /// For each almost-satisfied incompatibility mentioning a package in the
    /// worklist, derive the negation of its unsettled term; on a satisfied
    /// incompatibility, run conflict resolution and restart propagation from
    /// the learned cause's pivot.
    ///
    /// Returns the satisfier causes, i.e. the pivot package and learned
    /// incompatibility of every conflict resolved along the way, so the
    /// driver can feed its conflict statistics.
    #[allow(clippy::type_complexity)]
    pub(crate) fn unit_propagation(
        &mut self,
        package: Id<DP::P>,
    ) -> Result<SmallVec<(Id<DP::P>, IncompDpId<DP>)>, NoSolutionError<DP>> {
        let mut satisfier_causes = SmallVec::empty();
        self.unit_propagation_buffer.clear();
        self.unit_propagation_buffer.push(package);
        while let Some(current_package) = self.unit_propagation_buffer.pop() {
            let mut conflict_id = None;
            let Some(pkg_incompats) = self.incompatibilities.get(&current_package) else {
                continue;
            };
            // Iterate in reverse order to evaluate the newest incompatibilities
            // first, those are the most likely to propagate.
            for &incompat_id in pkg_incompats.iter().rev() {
                if self.contradicted_incompatibilities.contains_key(&incompat_id) {
                    continue;
                }
                let current_incompat = &self.incompatibility_store[incompat_id];
                match self.partial_solution.relation(current_incompat) {
                    // All terms of the incompatibility hold: conflict. Keep
                    // scanning so contradicted siblings still get cached.
                    Relation::Satisfied => {
                        conflict_id = Some(incompat_id);
                    }
                    Relation::AlmostSatisfied(package_almost) => {
                        // Add `package_almost` to the worklist and derive the
                        // negation of its unsettled term.
                        if !self.unit_propagation_buffer.contains(&package_almost) {
                            self.unit_propagation_buffer.push(package_almost);
                        }
                        self.partial_solution.add_derivation(
                            package_almost,
                            incompat_id,
                            &self.incompatibility_store,
                        );
                        // With the derivation added, the incompatibility is
                        // contradicted until we backtrack over it.
                        self.contradicted_incompatibilities
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    Relation::Contradicted(_) => {
                        self.contradicted_incompatibilities
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    Relation::Inconclusive => {}
                }
            }
            if let Some(incompat_id) = conflict_id {
                let (package_almost, root_cause) = self
                    .conflict_resolution(incompat_id, &mut satisfier_causes)
                    .map_err(|terminal| self.build_derivation_tree(terminal))?;
                self.unit_propagation_buffer.clear();
                self.unit_propagation_buffer.push(package_almost);
                // Add to the partial solution with incompat as cause.
                self.partial_solution.add_derivation(
                    package_almost,
                    root_cause,
                    &self.incompatibility_store,
                );
                // After conflict resolution and the partial solution update,
                // the root cause incompatibility is contradicted.
                self.contradicted_incompatibilities
                    .insert(root_cause, self.partial_solution.current_decision_level());
            }
        }
        Ok(satisfier_causes)
    }

    /// Return the root cause or the terminal incompatibility. CF
    /// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#unit-propagation>
    ///
    /// When the satisfier and previous satisfier of the current
    /// incompatibility share a decision level, resolve it with the
    /// satisfier's own cause and loop; the fixpoint is reached when exactly
    /// one term sits at the current decision level (1-UIP), and we backjump.
    #[allow(clippy::type_complexity)]
    fn conflict_resolution(
        &mut self,
        incompatibility: IncompDpId<DP>,
        satisfier_causes: &mut SmallVec<(Id<DP::P>, IncompDpId<DP>)>,
    ) -> Result<(Id<DP::P>, IncompDpId<DP>), IncompDpId<DP>> {
        let mut current_incompat_id = incompatibility;
        let mut current_incompat_changed = false;
        loop {
            if self.incompatibility_store[current_incompat_id]
                .is_terminal(self.root_package, &self.root_version)
            {
                return Err(current_incompat_id);
            }
            log::info!(
                "conflict: {}",
                self.incompatibility_store[current_incompat_id].display(&self.package_store)
            );
            let (package, satisfier_search_result) = self.partial_solution.satisfier_search(
                &self.incompatibility_store[current_incompat_id],
                &self.incompatibility_store,
            );
            match satisfier_search_result {
                SatisfierSearch::DifferentDecisionLevels {
                    previous_satisfier_level,
                } => {
                    self.backtrack(
                        current_incompat_id,
                        current_incompat_changed,
                        previous_satisfier_level,
                    );
                    satisfier_causes.push((package, current_incompat_id));
                    return Ok((package, current_incompat_id));
                }
                SatisfierSearch::SameDecisionLevels { satisfier_cause } => {
                    let prior_cause = Incompatibility::prior_cause(
                        current_incompat_id,
                        satisfier_cause,
                        package,
                        &self.incompatibility_store,
                    );
                    current_incompat_id = self.incompatibility_store.alloc(prior_cause);
                    satisfier_causes.push((package, current_incompat_id));
                    current_incompat_changed = true;
                }
            }
        }
    }

    /// Backtracking.
    fn backtrack(
        &mut self,
        incompat: IncompDpId<DP>,
        incompat_changed: bool,
        decision_level: DecisionLevel,
    ) {
        self.partial_solution.backtrack(decision_level);
        // Contradictions found deeper than the backtrack level are not
        // contradictions anymore.
        self.contradicted_incompatibilities
            .retain(|_, dl| *dl <= decision_level);
        if incompat_changed {
            self.merge_incompatibility(incompat);
        }
    }

    /// Add this incompatibility into the set of all incompatibilities.
    ///
    /// PubGrub collapses identical dependencies from adjacent package
    /// versions into a single incompatibility: `a@1 depends on b` and
    /// `a@2 depends on b` become `a@1||2 depends on b`.
    ///
    /// When a merge succeeds, the older incompatibility is unindexed from the
    /// per-package lists and replaced by the merged one, and scanning
    /// continues: the merged result may itself merge with another past
    /// dependency.
    fn merge_incompatibility(&mut self, mut id: IncompDpId<DP>) {
        if let Some((p1, p2)) = self.incompatibility_store[id].as_dependency() {
            let deps_lookup = self.merged_dependencies.entry((p1, p2)).or_default();
            let mut merged_any = false;
            for past in deps_lookup.as_mut_slice().iter_mut() {
                let Some(merged) = self.incompatibility_store[*past]
                    .merge_dependents(&self.incompatibility_store[id])
                else {
                    continue;
                };
                let old = *past;
                let new = self.incompatibility_store.alloc(merged);
                for (pkg, _) in self.incompatibility_store[new].iter() {
                    if let Some(list) = self.incompatibilities.get_mut(&pkg) {
                        list.retain(|i| *i != old);
                    }
                }
                *past = new;
                id = new;
                merged_any = true;
            }
            if !merged_any {
                deps_lookup.push(id);
            }
        }
        for (pkg, term) in self.incompatibility_store[id].iter() {
            debug_assert_ne!(term, &Term::any());
            self.incompatibilities.entry(pkg).or_default().push(id);
        }
    }

    // Error reporting #########################################################

    /// Build the structured failure report rooted at the given terminal
    /// incompatibility.
    fn build_derivation_tree(
        &self,
        incompat: IncompDpId<DP>,
    ) -> DerivationTree<DP::P, DP::VS, DP::M> {
        let mut all_ids: Set<IncompDpId<DP>> = Set::default();
        let mut shared_ids = Set::default();
        let mut stack = vec![incompat];
        while let Some(i) = stack.pop() {
            if let Some((id1, id2)) = self.incompatibility_store[i].causes() {
                if all_ids.contains(&i) {
                    shared_ids.insert(i);
                } else {
                    stack.push(id1);
                    stack.push(id2);
                }
            }
            all_ids.insert(i);
        }
        // To avoid recursion we need to generate trees in topological order.
        // That is to say we need to ensure that the causes are processed before the
        // incompatibility they effect.
        let mut sorted_ids = all_ids.into_iter().collect::<Vec<_>>();
        sorted_ids.sort_unstable_by_key(|id| id.into_raw());
        let mut precomputed = Map::default();
        for id in sorted_ids {
            let tree = Incompatibility::build_derivation_tree(
                id,
                &shared_ids,
                &self.incompatibility_store,
                &self.package_store,
                &precomputed,
            );
            precomputed.insert(id, Arc::new(tree));
        }
        // Now the user can refer to the entire tree from its root.
        Arc::into_inner(precomputed.remove(&incompat).unwrap()).unwrap()
    }
}
